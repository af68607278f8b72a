//! SOCKS5 reply encoder/decoder

use crate::error::{ReplyCode, Socks5Error};
use crate::socks::consts::*;
use crate::socks::types::TargetAddr;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// The single reply frame a connection receives, mirroring the request
/// layout:
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Outcome of the request
    pub status: ReplyCode,
    /// Bound address; the all-zero endpoint on failure paths
    pub bound: TargetAddr,
}

impl Reply {
    /// Success reply echoing the outbound connection's local endpoint
    pub fn success(bound: SocketAddr) -> Self {
        Reply {
            status: ReplyCode::Succeeded,
            bound: TargetAddr::Ip(bound),
        }
    }

    /// Failure reply with the zero address
    pub fn failure(status: ReplyCode) -> Self {
        Reply {
            status,
            bound: TargetAddr::unspecified(),
        }
    }

    /// Wire encoding of this reply
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![SOCKS5_VERSION, self.status.into(), RESERVED];
        self.bound.encode_into(&mut bytes);
        bytes
    }

    /// Write the reply and flush
    pub async fn write_to<S>(&self, stream: &mut S) -> Result<(), Socks5Error>
    where
        S: AsyncWrite + Unpin + ?Sized,
    {
        stream.write_all(&self.to_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Decode a reply frame. Used by clients and by round-trip tests; the
    /// server itself only encodes.
    pub async fn read_from<S>(stream: &mut S) -> Result<Self, Socks5Error>
    where
        S: AsyncRead + Unpin + ?Sized,
    {
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await?;

        if header[0] != SOCKS5_VERSION {
            return Err(Socks5Error::UnsupportedVersion(header[0]));
        }

        let status = ReplyCode::try_from(header[1])?;
        let bound = TargetAddr::read_from(stream, header[3]).await?;

        Ok(Reply { status, bound })
    }
}

/// Write a reply in one call; `bound` falls back to the zero address.
pub async fn send_reply<S>(
    stream: &mut S,
    status: ReplyCode,
    bound: Option<SocketAddr>,
) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    let reply = match bound {
        Some(addr) => Reply {
            status,
            bound: TargetAddr::Ip(addr),
        },
        None => Reply::failure(status),
    };
    reply.write_to(stream).await
}
