//! SOCKS5 request decoder

use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::types::{Request, SocksCommand, TargetAddr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Decode the request frame that follows a successful negotiation.
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Unknown commands and address types surface as the matching
/// [`Socks5Error`] variants so the lifecycle can still answer with the
/// correct reply code before closing.
pub async fn parse_request<S>(stream: &mut S) -> Result<Request, Socks5Error>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;

    let version = header[0];
    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let command =
        SocksCommand::from_byte(header[1]).ok_or(Socks5Error::CommandNotSupported(header[1]))?;

    // header[2] is the reserved byte; tolerated regardless of value.
    let dest = TargetAddr::read_from(stream, header[3]).await?;

    Ok(Request { command, dest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn connect_request(atyp: u8, addr: &[u8], port: u16) -> Vec<u8> {
        let mut request = vec![SOCKS5_VERSION, CMD_CONNECT, RESERVED, atyp];
        request.extend_from_slice(addr);
        request.extend_from_slice(&port.to_be_bytes());
        request
    }

    #[tokio::test]
    async fn test_parse_connect_ipv4() {
        let mut cursor = Cursor::new(connect_request(ATYP_IPV4, &[192, 168, 1, 1], 8080));

        let request = parse_request(&mut cursor).await.unwrap();
        assert_eq!(request.command, SocksCommand::Connect);
        assert_eq!(
            request.dest,
            TargetAddr::Ip("192.168.1.1:8080".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn test_parse_connect_domain() {
        let mut addr = vec![11u8];
        addr.extend_from_slice(b"example.com");
        let mut cursor = Cursor::new(connect_request(ATYP_DOMAIN, &addr, 443));

        let request = parse_request(&mut cursor).await.unwrap();
        assert_eq!(
            request.dest,
            TargetAddr::Domain("example.com".to_string(), 443)
        );
    }

    #[tokio::test]
    async fn test_parse_connect_ipv6() {
        let mut ip = [0u8; 16];
        ip[15] = 1;
        let mut cursor = Cursor::new(connect_request(ATYP_IPV6, &ip, 80));

        let request = parse_request(&mut cursor).await.unwrap();
        assert_eq!(request.dest, TargetAddr::Ip("[::1]:80".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_parse_bind_and_udp_associate() {
        let mut request = connect_request(ATYP_IPV4, &[0, 0, 0, 0], 0);
        request[1] = CMD_BIND;
        let parsed = parse_request(&mut Cursor::new(request)).await.unwrap();
        assert_eq!(parsed.command, SocksCommand::Bind);

        let mut request = connect_request(ATYP_IPV4, &[0, 0, 0, 0], 0);
        request[1] = CMD_UDP_ASSOCIATE;
        let parsed = parse_request(&mut Cursor::new(request)).await.unwrap();
        assert_eq!(parsed.command, SocksCommand::UdpAssociate);
    }

    #[tokio::test]
    async fn test_parse_rejects_bad_version() {
        let mut request = connect_request(ATYP_IPV4, &[127, 0, 0, 1], 80);
        request[0] = 0x04;

        let err = parse_request(&mut Cursor::new(request)).await.unwrap_err();
        assert!(matches!(err, Socks5Error::UnsupportedVersion(0x04)));
    }

    #[tokio::test]
    async fn test_parse_unknown_command() {
        let mut request = connect_request(ATYP_IPV4, &[127, 0, 0, 1], 80);
        request[1] = 0x09;

        let err = parse_request(&mut Cursor::new(request)).await.unwrap_err();
        assert!(matches!(err, Socks5Error::CommandNotSupported(0x09)));
    }

    #[tokio::test]
    async fn test_parse_unknown_atyp() {
        let mut request = connect_request(ATYP_IPV4, &[127, 0, 0, 1], 80);
        request[3] = 0x05;

        let err = parse_request(&mut Cursor::new(request)).await.unwrap_err();
        assert!(matches!(err, Socks5Error::AddressTypeNotSupported(0x05)));
    }

    #[tokio::test]
    async fn test_parse_truncated_header() {
        let mut cursor = Cursor::new(vec![SOCKS5_VERSION, CMD_CONNECT]);
        let err = parse_request(&mut cursor).await.unwrap_err();
        assert!(matches!(err, Socks5Error::Io(_)));
    }
}
