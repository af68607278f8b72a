//! # Socksden - Standalone SOCKS5 Proxy Server
//!
//! Socksden is a SOCKS5 proxy server: it accepts inbound connections,
//! negotiates an authentication method, decodes the proxy request, opens the
//! outbound connection and relays bytes in both directions until either side
//! closes.
//!
//! ## Features
//!
//! - **CONNECT** command with IPv4, IPv6 and domain-name targets
//! - **Pluggable authentication**: anonymous and username/password out of
//!   the box, custom methods via the [`socks::Authenticator`] trait
//! - **Pluggable collaborators**: credential store, name resolver and egress
//!   policy are traits with sensible defaults
//! - **One task per connection**, no shared mutable state
//!
//! BIND and UDP ASSOCIATE are answered with "command not supported".
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksden::config::load_config;
//! use socksden::socks::Server;
//! use std::sync::Arc;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let server = Arc::new(Server::new(&config.server)?);
//!     let listener = server.bind().await?;
//!
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!     server.run(listener, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client -> negotiation -> request decode -> dispatch -> reply -> relay
//! ```
//!
//! Every accepted connection runs that pipeline in its own task; the only
//! shared state is the read-only server configuration.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{ProxyError, ReplyCode, Socks5Error};
pub use socks::Server;

/// Version of the Socksden library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
