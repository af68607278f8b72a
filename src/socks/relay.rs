//! Bidirectional byte relay
//!
//! The bulk-transfer phase after a successful CONNECT. Two copy directions
//! run concurrently; the first to terminate ends the session and the other
//! direction is cancelled, not drained.

use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

/// Relay bytes between `client` and `target` until either direction reaches
/// end-of-stream or fails.
///
/// Completion of either direction wins: the sibling copy is cancelled and
/// both streams are closed on return, so neither side can block forever. A
/// clean EOF is success; the first I/O error observed is returned.
pub async fn relay<A, B>(client: A, target: B) -> io::Result<()>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut target_read, mut target_write) = tokio::io::split(target);

    let client_to_target = tokio::io::copy(&mut client_read, &mut target_write);
    let target_to_client = tokio::io::copy(&mut target_read, &mut client_write);

    let result = tokio::select! {
        r = client_to_target => r.map(|bytes| ("client->target", bytes)),
        r = target_to_client => r.map(|bytes| ("target->client", bytes)),
    };

    // Both halves are dropped on return, closing the underlying streams and
    // unblocking whatever the losing direction was waiting on.
    match result {
        Ok((direction, bytes)) => {
            tracing::debug!(direction, bytes, "relay finished");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "relay failed");
            Err(e)
        }
    }
}
