//! Egress policy hook
//!
//! Consulted by the dispatcher before dialing; a rejection maps to the
//! "connection not allowed" reply.

use crate::socks::types::TargetAddr;
use async_trait::async_trait;
use std::fmt::Debug;
use std::net::SocketAddr;

/// Decides whether `peer` may open a connection to `dest`.
#[async_trait]
pub trait EgressPolicy: Send + Sync + Debug {
    /// Return `false` to reject the destination.
    async fn allow(&self, peer: SocketAddr, dest: &TargetAddr) -> bool;
}

/// Default policy: every destination is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

#[async_trait]
impl EgressPolicy for PermitAll {
    async fn allow(&self, _peer: SocketAddr, _dest: &TargetAddr) -> bool {
        true
    }
}

/// Rejects every destination. Useful for lockdown configurations and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl EgressPolicy for DenyAll {
    async fn allow(&self, _peer: SocketAddr, _dest: &TargetAddr) -> bool {
        false
    }
}
