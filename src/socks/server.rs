//! Server and per-connection lifecycle
//!
//! Accepts inbound connections and runs each through the SOCKS5 stages:
//! negotiation, request decode, dispatch, reply, relay. Each connection is
//! an independent task sharing only the read-only [`Server`] configuration.

use crate::config::{ServerConfig, TcpConfig};
use crate::error::{ProxyError, ReplyCode, Socks5Error};
use crate::socks::auth::{
    auth_table, negotiate, AuthMethods, Authenticator, NoAuthAuthenticator, UserPassAuthenticator,
};
use crate::socks::command::{parse_request, send_reply};
use crate::socks::credentials::{CredentialStore, StaticCredentials};
use crate::socks::dispatch::Dispatcher;
use crate::socks::policy::{EgressPolicy, PermitAll};
use crate::socks::relay::relay;
use crate::socks::resolve::{NameResolver, SystemResolver};
use crate::socks::types::SocksCommand;
use crate::socks::IoStream;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// TCP options applied to accepted connections
#[derive(Debug, Clone, Copy)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            keepalive_secs: Some(20),
            keepalive_interval: Some(8),
        }
    }
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: Some(config.keepalive_secs),
            keepalive_interval: Some(config.keepalive_interval),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// The SOCKS5 server: the read-only configuration shared by every
/// connection task.
///
/// Built from a [`ServerConfig`] and optionally customized with the
/// builder-style `with_*` methods before the first connection is served.
#[derive(Debug)]
pub struct Server {
    listen_addr: String,
    auth_methods: AuthMethods,
    dispatcher: Dispatcher,
    socket_opts: SocketOpts,
}

impl Server {
    /// Build a server from configuration.
    ///
    /// Registers a username/password authenticator when users are
    /// configured, and the anonymous method unless `auth.required` is set.
    pub fn new(config: &ServerConfig) -> Result<Self, ProxyError> {
        config.validate().map_err(ProxyError::Config)?;

        let mut authenticators: Vec<Arc<dyn Authenticator>> = Vec::new();
        if !config.auth.users.is_empty() {
            let store = StaticCredentials::from(config.auth.users.clone());
            authenticators.push(Arc::new(UserPassAuthenticator::new(Arc::new(store))));
        }
        if !config.auth.required {
            authenticators.push(Arc::new(NoAuthAuthenticator));
        }

        let connect_timeout =
            (config.connect_timeout > 0).then(|| Duration::from_secs(config.connect_timeout));

        Ok(Server {
            listen_addr: config.listen_addr.clone(),
            auth_methods: auth_table(authenticators),
            dispatcher: Dispatcher::new(
                Arc::new(SystemResolver),
                Arc::new(PermitAll),
                connect_timeout,
            ),
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
        })
    }

    /// Register an additional authenticator, replacing any existing one for
    /// the same method code.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.auth_methods
            .insert(authenticator.method(), authenticator);
        self
    }

    /// Use a username/password authenticator backed by `store`.
    pub fn with_credentials(self, store: Arc<dyn CredentialStore>) -> Self {
        self.with_authenticator(Arc::new(UserPassAuthenticator::new(store)))
    }

    /// Override the name resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.dispatcher.set_resolver(resolver);
        self
    }

    /// Install an egress policy
    pub fn with_policy(mut self, policy: Arc<dyn EgressPolicy>) -> Self {
        self.dispatcher.set_policy(policy);
        self
    }

    /// Change the outbound dial timeout
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.dispatcher.set_connect_timeout(timeout);
        self
    }

    /// Bind the configured listen address
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind(&self.listen_addr).await
    }

    /// Accept loop: one task per connection until the shutdown signal fires.
    pub async fn run(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<bool>,
    ) -> anyhow::Result<()> {
        info!(addr = %listener.local_addr()?, "SOCKS5 server listening");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("shutdown signal received, stopping accept loop");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "failed to accept connection");
                            continue;
                        }
                    };

                    if let Err(e) = self.socket_opts.apply(&stream) {
                        warn!(peer = %peer, error = %e, "failed to apply socket options");
                    }

                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        debug!(peer = %peer, "connection accepted");
                        if let Err(e) = server.serve_connection(stream, peer).await {
                            debug!(peer = %peer, error = %e, "connection closed with error");
                        }
                    });
                }
            }
        }

        Ok(())
    }

    /// Run one connection through the full SOCKS5 lifecycle.
    ///
    /// Any failure terminates the connection after a best-effort reply; the
    /// streams are released on every exit path by ownership.
    pub async fn serve_connection<S>(&self, mut stream: S, peer: SocketAddr) -> Result<(), ProxyError>
    where
        S: IoStream,
    {
        let auth_ctx = negotiate(&mut stream, peer, &self.auth_methods).await?;
        debug!(peer = %peer, method = %auth_ctx.method, "negotiation complete");

        let request = match parse_request(&mut stream).await {
            Ok(request) => request,
            Err(e) => {
                self.reply_error(&mut stream, &e).await;
                return Err(e.into());
            }
        };
        info!(peer = %peer, command = %request.command, dest = %request.dest, "request received");

        match request.command {
            SocksCommand::Connect => {
                let target = match self.dispatcher.connect(peer, &request.dest).await {
                    Ok(target) => target,
                    Err(e) => {
                        self.reply_error(&mut stream, &e).await;
                        return Err(e.into());
                    }
                };

                let bound = target.local_addr().ok();
                send_reply(&mut stream, ReplyCode::Succeeded, bound).await?;
                info!(peer = %peer, dest = %request.dest, "tunnel established");

                relay(stream, target).await.map_err(ProxyError::Io)?;
                debug!(peer = %peer, "session closed");
                Ok(())
            }

            SocksCommand::Bind | SocksCommand::UdpAssociate => {
                warn!(peer = %peer, command = %request.command, "command not supported");
                let e = Socks5Error::CommandNotSupported(request.command.to_byte());
                self.reply_error(&mut stream, &e).await;
                Err(e.into())
            }
        }
    }

    /// Best-effort error reply; a failure to deliver it does not change the
    /// connection's outcome.
    async fn reply_error(&self, stream: &mut dyn IoStream, error: &Socks5Error) {
        if let Some(code) = error.reply_code() {
            if let Err(write_err) = send_reply(stream, code, None).await {
                debug!(error = %write_err, "failed to write error reply");
            }
        }
    }
}
