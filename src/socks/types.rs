//! Core SOCKS5 protocol types
//!
//! The request command and the target address abstraction shared by the
//! request parser, the reply codec and the dispatcher.

use super::consts::*;
use crate::error::Socks5Error;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// SOCKS5 request commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// Establish a TCP connection to the target
    Connect,
    /// Wait for an inbound connection (not implemented)
    Bind,
    /// Establish a UDP relay (not implemented)
    UdpAssociate,
}

impl SocksCommand {
    /// Parse a command byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_CONNECT => Some(SocksCommand::Connect),
            CMD_BIND => Some(SocksCommand::Bind),
            CMD_UDP_ASSOCIATE => Some(SocksCommand::UdpAssociate),
            _ => None,
        }
    }

    /// Wire byte for this command
    pub fn to_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => CMD_CONNECT,
            SocksCommand::Bind => CMD_BIND,
            SocksCommand::UdpAssociate => CMD_UDP_ASSOCIATE,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// A network endpoint as carried in a SOCKS5 frame.
///
/// Either a literal IPv4/IPv6 address with port, or a domain name pending
/// resolution. Domain targets are resolved lazily, once, at dispatch time;
/// resolutions are never cached across connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// Literal IP address with port
    Ip(SocketAddr),
    /// Domain name with port, resolved at dispatch time
    Domain(String, u16),
}

impl TargetAddr {
    /// The all-zero IPv4 endpoint used on failure-path replies
    pub fn unspecified() -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// The ATYP byte this address encodes as
    pub fn addr_type(&self) -> u8 {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => ATYP_IPV4,
            TargetAddr::Ip(SocketAddr::V6(_)) => ATYP_IPV6,
            TargetAddr::Domain(_, _) => ATYP_DOMAIN,
        }
    }

    /// Read the address portion of a frame, given an already-consumed ATYP
    /// byte: ADDR bytes (4 / 16 / 1-length-prefixed) followed by a big-endian
    /// port.
    pub async fn read_from<S>(stream: &mut S, addr_type: u8) -> Result<Self, Socks5Error>
    where
        S: AsyncRead + Unpin + ?Sized,
    {
        match addr_type {
            ATYP_IPV4 => {
                let mut addr = [0u8; 4];
                stream.read_exact(&mut addr).await?;
                let port = read_port(stream).await?;
                Ok(TargetAddr::Ip(SocketAddr::new(
                    IpAddr::V4(Ipv4Addr::from(addr)),
                    port,
                )))
            }

            ATYP_DOMAIN => {
                let mut len_buf = [0u8; 1];
                stream.read_exact(&mut len_buf).await?;
                let domain_len = len_buf[0] as usize;

                if domain_len == 0 {
                    return Err(Socks5Error::Protocol("empty domain name".to_string()));
                }

                let mut domain_buf = vec![0u8; domain_len];
                stream.read_exact(&mut domain_buf).await?;
                let domain = String::from_utf8(domain_buf)
                    .map_err(|_| Socks5Error::Protocol("domain name is not UTF-8".to_string()))?;

                let port = read_port(stream).await?;
                Ok(TargetAddr::Domain(domain, port))
            }

            ATYP_IPV6 => {
                let mut addr = [0u8; 16];
                stream.read_exact(&mut addr).await?;
                let port = read_port(stream).await?;
                Ok(TargetAddr::Ip(SocketAddr::new(
                    IpAddr::V6(Ipv6Addr::from(addr)),
                    port,
                )))
            }

            other => Err(Socks5Error::AddressTypeNotSupported(other)),
        }
    }

    /// Append the wire encoding (ATYP, ADDR, PORT) to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => {
                buf.push(ATYP_IPV4);
                buf.extend_from_slice(&addr.ip().octets());
                buf.extend_from_slice(&addr.port().to_be_bytes());
            }
            TargetAddr::Ip(SocketAddr::V6(addr)) => {
                buf.push(ATYP_IPV6);
                buf.extend_from_slice(&addr.ip().octets());
                buf.extend_from_slice(&addr.port().to_be_bytes());
            }
            TargetAddr::Domain(domain, port) => {
                debug_assert!(!domain.is_empty() && domain.len() <= MAX_DOMAIN_LEN);
                buf.push(ATYP_DOMAIN);
                buf.push(domain.len() as u8);
                buf.extend_from_slice(domain.as_bytes());
                buf.extend_from_slice(&port.to_be_bytes());
            }
        }
    }
}

async fn read_port<S>(stream: &mut S) -> Result<u16, Socks5Error>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut port_buf = [0u8; 2];
    stream.read_exact(&mut port_buf).await?;
    Ok(u16::from_be_bytes(port_buf))
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        TargetAddr::Ip(addr)
    }
}

/// A decoded SOCKS5 request frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Requested command
    pub command: SocksCommand,
    /// Destination endpoint
    pub dest: TargetAddr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_command_bytes() {
        assert_eq!(SocksCommand::from_byte(1), Some(SocksCommand::Connect));
        assert_eq!(SocksCommand::from_byte(2), Some(SocksCommand::Bind));
        assert_eq!(SocksCommand::from_byte(3), Some(SocksCommand::UdpAssociate));
        assert_eq!(SocksCommand::from_byte(4), None);
        assert_eq!(SocksCommand::Connect.to_byte(), 1);
    }

    #[test]
    fn test_target_addr_display() {
        let addr = TargetAddr::Ip("127.0.0.1:8080".parse().unwrap());
        assert_eq!(format!("{}", addr), "127.0.0.1:8080");

        let addr = TargetAddr::Domain("example.com".to_string(), 443);
        assert_eq!(format!("{}", addr), "example.com:443");
    }

    #[test]
    fn test_target_addr_unspecified() {
        let addr = TargetAddr::unspecified();
        assert_eq!(addr.port(), 0);
        assert_eq!(addr.addr_type(), ATYP_IPV4);
    }

    #[tokio::test]
    async fn test_read_ipv4() {
        let mut bytes = vec![192, 168, 1, 1];
        bytes.extend_from_slice(&8080u16.to_be_bytes());
        let mut cursor = Cursor::new(bytes);

        let addr = TargetAddr::read_from(&mut cursor, ATYP_IPV4).await.unwrap();
        assert_eq!(addr, TargetAddr::Ip("192.168.1.1:8080".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_read_domain() {
        let mut bytes = vec![11];
        bytes.extend_from_slice(b"example.com");
        bytes.extend_from_slice(&443u16.to_be_bytes());
        let mut cursor = Cursor::new(bytes);

        let addr = TargetAddr::read_from(&mut cursor, ATYP_DOMAIN)
            .await
            .unwrap();
        assert_eq!(addr, TargetAddr::Domain("example.com".to_string(), 443));
    }

    #[tokio::test]
    async fn test_read_ipv6() {
        let mut bytes = vec![0u8; 15];
        bytes.push(1); // ::1
        bytes.extend_from_slice(&80u16.to_be_bytes());
        let mut cursor = Cursor::new(bytes);

        let addr = TargetAddr::read_from(&mut cursor, ATYP_IPV6).await.unwrap();
        assert_eq!(addr, TargetAddr::Ip("[::1]:80".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_read_unknown_atyp() {
        let mut cursor = Cursor::new(vec![0u8; 6]);
        let err = TargetAddr::read_from(&mut cursor, 0x02).await.unwrap_err();
        assert!(matches!(err, Socks5Error::AddressTypeNotSupported(0x02)));
    }

    #[tokio::test]
    async fn test_read_empty_domain_rejected() {
        let mut cursor = Cursor::new(vec![0, 0, 80]);
        let err = TargetAddr::read_from(&mut cursor, ATYP_DOMAIN)
            .await
            .unwrap_err();
        assert!(matches!(err, Socks5Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_read_truncated_address_is_io_error() {
        let mut cursor = Cursor::new(vec![192, 168]); // 2 of 4 IPv4 bytes
        let err = TargetAddr::read_from(&mut cursor, ATYP_IPV4)
            .await
            .unwrap_err();
        assert!(matches!(err, Socks5Error::Io(_)));
    }

    #[tokio::test]
    async fn test_encode_decode_round_trip() {
        let cases = [
            TargetAddr::Ip("10.0.0.1:9090".parse().unwrap()),
            TargetAddr::Ip("[2001:db8::1]:443".parse().unwrap()),
            TargetAddr::Domain("example.com".to_string(), 8443),
        ];

        for addr in cases {
            let mut buf = Vec::new();
            addr.encode_into(&mut buf);

            let atyp = buf[0];
            let mut cursor = Cursor::new(buf[1..].to_vec());
            let decoded = TargetAddr::read_from(&mut cursor, atyp).await.unwrap();
            assert_eq!(decoded, addr);
        }
    }
}
