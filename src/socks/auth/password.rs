//! Username/password authentication (RFC 1929)

use super::{AuthContext, AuthMethod, Authenticator};
use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::credentials::CredentialStore;
use crate::socks::IoStream;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Authenticates clients against a [`CredentialStore`].
///
/// Sub-negotiation frames:
///
/// ```text
/// client:  [VER=0x01][ULEN][UNAME...][PLEN][PASSWD...]
/// server:  [VER=0x01][STATUS]        (0x00 success, 0x01 failure)
/// ```
///
/// A rejected credential pair is terminal for the connection; there is no
/// second attempt.
#[derive(Debug, Clone)]
pub struct UserPassAuthenticator {
    credentials: Arc<dyn CredentialStore>,
}

impl UserPassAuthenticator {
    /// Create an authenticator backed by the given store
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        UserPassAuthenticator { credentials }
    }
}

#[async_trait]
impl Authenticator for UserPassAuthenticator {
    fn method(&self) -> AuthMethod {
        AuthMethod::USER_PASS
    }

    async fn authenticate(
        &self,
        stream: &mut dyn IoStream,
        peer: SocketAddr,
    ) -> Result<AuthContext, Socks5Error> {
        stream
            .write_all(&[SOCKS5_VERSION, AuthMethod::USER_PASS.0])
            .await?;
        stream.flush().await?;

        let mut header = [0u8; 2];
        stream.read_exact(&mut header).await?;

        let version = header[0];
        if version != AUTH_SUBNEG_VERSION {
            return Err(Socks5Error::UnsupportedAuthVersion(version));
        }

        let username = read_field(stream, header[1] as usize).await?;

        let mut len_buf = [0u8; 1];
        stream.read_exact(&mut len_buf).await?;
        let password = read_field(stream, len_buf[0] as usize).await?;

        if self.credentials.validate(&username, &password, peer).await {
            stream
                .write_all(&[AUTH_SUBNEG_VERSION, AUTH_STATUS_SUCCESS])
                .await?;
            stream.flush().await?;

            let mut ctx = AuthContext::new(AuthMethod::USER_PASS);
            ctx.payload.insert("Username".to_string(), username);
            Ok(ctx)
        } else {
            tracing::warn!(peer = %peer, user = %username, "authentication rejected");
            stream
                .write_all(&[AUTH_SUBNEG_VERSION, AUTH_STATUS_FAILURE])
                .await?;
            stream.flush().await?;
            Err(Socks5Error::AuthenticationFailed)
        }
    }
}

/// Read a length-declared field; short reads surface as I/O errors, never as
/// an authentication failure.
async fn read_field(stream: &mut dyn IoStream, len: usize) -> Result<String, Socks5Error> {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    String::from_utf8(buf)
        .map_err(|_| Socks5Error::Protocol("credential field is not UTF-8".to_string()))
}
