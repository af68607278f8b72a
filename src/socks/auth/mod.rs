//! SOCKS5 authentication negotiation
//!
//! The server is configured with a table of [`Authenticator`]s keyed by
//! method code. [`negotiate`] reads the client's offer list, picks the first
//! offered method present in the table and drives that authenticator's wire
//! exchange.

mod none;
mod password;

pub use none::NoAuthAuthenticator;
pub use password::UserPassAuthenticator;

use super::consts::*;
use super::IoStream;
use crate::error::Socks5Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A SOCKS5 authentication method code.
///
/// Open-ended on purpose: the server configuration maps a subset of codes to
/// authenticators, and codes it does not know about simply never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthMethod(
    /// Raw method code byte
    pub u8,
);

impl AuthMethod {
    /// No authentication required
    pub const NO_AUTH: AuthMethod = AuthMethod(0x00);
    /// GSSAPI (not implemented here, named for diagnostics)
    pub const GSSAPI: AuthMethod = AuthMethod(0x01);
    /// Username/password authentication
    pub const USER_PASS: AuthMethod = AuthMethod(0x02);
    /// "No acceptable methods" sentinel, never a valid table key
    pub const NO_ACCEPTABLE: AuthMethod = AuthMethod(0xFF);
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AuthMethod::NO_AUTH => write!(f, "NoAuth"),
            AuthMethod::GSSAPI => write!(f, "GSSAPI"),
            AuthMethod::USER_PASS => write!(f, "UserPass"),
            AuthMethod::NO_ACCEPTABLE => write!(f, "NoAcceptable"),
            AuthMethod(other) => write!(f, "Method({:#04x})", other),
        }
    }
}

/// Immutable result of a successful negotiation, carried for the rest of the
/// connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// The method that authenticated this connection
    pub method: AuthMethod,
    /// Method-specific payload; for UserPass contains `"Username"`
    pub payload: HashMap<String, String>,
}

impl AuthContext {
    /// Context with an empty payload
    pub fn new(method: AuthMethod) -> Self {
        AuthContext {
            method,
            payload: HashMap::new(),
        }
    }

    /// The authenticated username, if the method established one
    pub fn username(&self) -> Option<&str> {
        self.payload.get("Username").map(|s| s.as_str())
    }
}

/// One authentication method's wire exchange.
///
/// Implementations write their own method-selection reply (`[0x05, code]`)
/// before running any sub-negotiation, mirroring the frame layout in §3 of
/// RFC 1928.
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// The method code this authenticator serves
    fn method(&self) -> AuthMethod;

    /// Run the exchange on an already-accepted connection.
    async fn authenticate(
        &self,
        stream: &mut dyn IoStream,
        peer: SocketAddr,
    ) -> Result<AuthContext, Socks5Error>;
}

/// Table of configured authenticators, resolved once at server start and
/// read-only thereafter.
pub type AuthMethods = HashMap<AuthMethod, Arc<dyn Authenticator>>;

/// Build an authenticator table from a list, keyed by each method code.
pub fn auth_table<I>(authenticators: I) -> AuthMethods
where
    I: IntoIterator<Item = Arc<dyn Authenticator>>,
{
    authenticators
        .into_iter()
        .map(|a| (a.method(), a))
        .collect()
}

/// Run the method negotiation on a fresh connection.
///
/// Reads `[VER, NMETHODS, METHODS...]` and selects the **first offered
/// method in client order** that the table supports, then hands the stream
/// to that authenticator. If nothing matches, answers `[0x05, 0xFF]` and
/// fails with the offered list; no further bytes are read from the client.
pub async fn negotiate(
    stream: &mut dyn IoStream,
    peer: SocketAddr,
    methods: &AuthMethods,
) -> Result<AuthContext, Socks5Error> {
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).await?;

    let version = header[0];
    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let mut offered = vec![0u8; header[1] as usize];
    stream.read_exact(&mut offered).await?;

    // Client order decides the tie-break, not server preference.
    for &code in &offered {
        if let Some(authenticator) = methods.get(&AuthMethod(code)) {
            tracing::debug!(peer = %peer, method = %authenticator.method(), "auth method selected");
            return authenticator.authenticate(stream, peer).await;
        }
    }

    stream
        .write_all(&[SOCKS5_VERSION, AuthMethod::NO_ACCEPTABLE.0])
        .await?;
    stream.flush().await?;

    Err(Socks5Error::NoAcceptableMethod { offered })
}
