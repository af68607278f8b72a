//! Name resolution for domain targets
//!
//! Resolution happens once per connection at dispatch time and is never
//! cached here; an override resolver can be installed on the server.

use crate::error::Socks5Error;
use crate::socks::types::TargetAddr;
use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::net::SocketAddr;

/// Turns a domain name into a concrete socket endpoint.
#[async_trait]
pub trait NameResolver: Send + Sync + Debug {
    /// Resolve `domain` to an endpoint carrying `port`.
    async fn resolve(&self, domain: &str, port: u16) -> io::Result<SocketAddr>;
}

/// Default resolver using the operating system's resolution via
/// [`tokio::net::lookup_host`]. Takes the first returned address.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl NameResolver for SystemResolver {
    async fn resolve(&self, domain: &str, port: u16) -> io::Result<SocketAddr> {
        tokio::net::lookup_host((domain, port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no addresses found for {domain}"),
                )
            })
    }
}

/// Resolve a target to a dialable endpoint. Literal addresses pass through
/// untouched; domains go through the resolver.
pub async fn resolve_target(
    resolver: &dyn NameResolver,
    target: &TargetAddr,
) -> Result<SocketAddr, Socks5Error> {
    match target {
        TargetAddr::Ip(addr) => Ok(*addr),
        TargetAddr::Domain(domain, port) => resolver
            .resolve(domain, *port)
            .await
            .map_err(|source| Socks5Error::Resolve {
                domain: domain.clone(),
                source,
            }),
    }
}
