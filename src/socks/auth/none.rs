//! "No authentication" method

use super::{AuthContext, AuthMethod, Authenticator};
use crate::error::Socks5Error;
use crate::socks::consts::SOCKS5_VERSION;
use crate::socks::IoStream;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;

/// Accepts every connection without credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthAuthenticator;

#[async_trait]
impl Authenticator for NoAuthAuthenticator {
    fn method(&self) -> AuthMethod {
        AuthMethod::NO_AUTH
    }

    async fn authenticate(
        &self,
        stream: &mut dyn IoStream,
        _peer: SocketAddr,
    ) -> Result<AuthContext, Socks5Error> {
        stream
            .write_all(&[SOCKS5_VERSION, AuthMethod::NO_AUTH.0])
            .await?;
        stream.flush().await?;
        Ok(AuthContext::new(AuthMethod::NO_AUTH))
    }
}
