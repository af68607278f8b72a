//! SOCKS5 protocol implementation
//!
//! This module implements the server side of the SOCKS5 protocol (RFC 1928)
//! with username/password authentication (RFC 1929): method negotiation,
//! request/reply codec, command dispatch and the bidirectional relay.

mod auth;
mod command;
mod consts;
mod credentials;
mod dispatch;
mod policy;
mod relay;
mod resolve;
mod server;
mod types;

pub use auth::{
    auth_table, negotiate, AuthContext, AuthMethod, AuthMethods, Authenticator,
    NoAuthAuthenticator, UserPassAuthenticator,
};
pub use command::{parse_request, send_reply, Reply};
pub use consts::*;
pub use credentials::{CredentialStore, StaticCredentials};
pub use dispatch::Dispatcher;
pub use policy::{DenyAll, EgressPolicy, PermitAll};
pub use relay::relay;
pub use resolve::{resolve_target, NameResolver, SystemResolver};
pub use server::{Server, SocketOpts};
pub use types::{Request, SocksCommand, TargetAddr};

use std::fmt::Debug;
use tokio::io::{AsyncRead, AsyncWrite};

/// Object-safe stream bound used where authenticators and the lifecycle
/// need virtual dispatch over the connection.
pub trait IoStream: AsyncRead + AsyncWrite + Unpin + Send + Debug {}

/// Blanket implementation: any matching stream type qualifies.
impl<T: AsyncRead + AsyncWrite + Unpin + Send + Debug> IoStream for T {}
