//! Command dispatch: resolve, police and dial the request target
//!
//! The dispatcher owns the policy hook, the resolver and the dial timeout.
//! It never touches the client stream; the connection lifecycle turns its
//! outcome into the single reply the client receives.

use crate::error::Socks5Error;
use crate::socks::policy::EgressPolicy;
use crate::socks::resolve::{resolve_target, NameResolver};
use crate::socks::types::TargetAddr;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Opens outbound connections for CONNECT requests.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    resolver: Arc<dyn NameResolver>,
    policy: Arc<dyn EgressPolicy>,
    connect_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher. `connect_timeout` of `None` dials without a
    /// deadline.
    pub fn new(
        resolver: Arc<dyn NameResolver>,
        policy: Arc<dyn EgressPolicy>,
        connect_timeout: Option<Duration>,
    ) -> Self {
        Dispatcher {
            resolver,
            policy,
            connect_timeout,
        }
    }

    /// Replace the name resolver
    pub fn set_resolver(&mut self, resolver: Arc<dyn NameResolver>) {
        self.resolver = resolver;
    }

    /// Replace the egress policy
    pub fn set_policy(&mut self, policy: Arc<dyn EgressPolicy>) {
        self.policy = policy;
    }

    /// Change the dial timeout
    pub fn set_connect_timeout(&mut self, timeout: Option<Duration>) {
        self.connect_timeout = timeout;
    }

    /// Establish the outbound connection for a CONNECT request.
    ///
    /// Runs the policy check, resolves domain targets (once, now), and dials
    /// with the configured timeout. Every failure carries the reply code the
    /// client is owed; success hands back the established stream whose local
    /// address becomes the bound address of the reply.
    pub async fn connect(
        &self,
        peer: SocketAddr,
        dest: &TargetAddr,
    ) -> Result<TcpStream, Socks5Error> {
        if !self.policy.allow(peer, dest).await {
            tracing::warn!(peer = %peer, dest = %dest, "destination rejected by policy");
            return Err(Socks5Error::NotAllowed {
                dest: dest.to_string(),
            });
        }

        let addr = resolve_target(self.resolver.as_ref(), dest).await?;
        tracing::debug!(peer = %peer, target = %addr, "dialing target");

        let dial = TcpStream::connect(addr);
        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, dial)
                .await
                .map_err(|_| Socks5Error::ConnectTimeout)?,
            None => dial.await,
        }
        .map_err(Socks5Error::dial)?;

        Ok(stream)
    }
}
