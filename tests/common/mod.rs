//! Test utilities for Socksden integration tests
//!
//! Raw-byte SOCKS5 client helpers and small fixture servers shared across
//! integration tests.

use socksden::config::ServerConfig;
use socksden::socks::{Server, TargetAddr};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Start a SOCKS5 server on an ephemeral port; returns its address and the
/// shutdown sender keeping it alive.
pub async fn start_proxy(server: Server) -> (SocketAddr, broadcast::Sender<bool>) {
    let server = std::sync::Arc::new(server);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move { server.run(listener, shutdown_rx).await });

    (addr, shutdown_tx)
}

/// Anonymous server with default configuration
pub fn anonymous_server() -> Server {
    Server::new(&ServerConfig::default()).unwrap()
}

/// Server requiring username/password authentication for the given users
pub fn password_server(users: &[(&str, &str)]) -> Server {
    let users: HashMap<String, String> = users
        .iter()
        .map(|(u, p)| (u.to_string(), p.to_string()))
        .collect();

    let mut config = ServerConfig::default();
    config.auth.required = true;
    config.auth.users = users;
    Server::new(&config).unwrap()
}

/// Echo server serving connections until dropped; returns its address.
pub async fn spawn_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut r, mut w) = stream.split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
            });
        }
    });

    addr
}

/// Method negotiation offer frame
pub fn method_offer(methods: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x05, methods.len() as u8];
    frame.extend_from_slice(methods);
    frame
}

/// Username/password sub-negotiation frame
pub fn userpass_frame(user: &str, pass: &str) -> Vec<u8> {
    let mut frame = vec![0x01, user.len() as u8];
    frame.extend_from_slice(user.as_bytes());
    frame.push(pass.len() as u8);
    frame.extend_from_slice(pass.as_bytes());
    frame
}

/// CONNECT request frame for any target kind
pub fn connect_request(target: &TargetAddr) -> Vec<u8> {
    let mut frame = vec![0x05, 0x01, 0x00];
    target.encode_into(&mut frame);
    frame
}

/// Drive the negotiation up to an accepted method, asserting the reply.
pub async fn negotiate_method(stream: &mut TcpStream, offer: &[u8], expected: u8) {
    stream.write_all(&method_offer(offer)).await.unwrap();

    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, expected]);
}
