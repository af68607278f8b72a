//! Error types for Socksden
//!
//! Two layers: [`Socks5Error`] for everything that can go wrong during the
//! protocol exchange on a single connection, and [`ProxyError`] for the
//! server-level wrapper.

use std::fmt;
use std::io;
use thiserror::Error;

/// Server-level error type
#[derive(Error, Debug)]
pub enum ProxyError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Socks5(#[from] Socks5Error),
}

/// Errors raised by the SOCKS5 negotiation, request and dispatch stages.
///
/// Every variant is fatal to the connection it occurred on. The lifecycle
/// uses [`Socks5Error::reply_code`] to decide which protocol reply, if any,
/// still has to be written before the connection is closed.
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Client spoke a SOCKS version other than 5
    #[error("unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Username/password sub-negotiation carried a bad version byte
    #[error("unsupported auth sub-negotiation version: {0}")]
    UnsupportedAuthVersion(u8),

    /// Malformed frame
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// None of the methods offered by the client is configured on the server
    #[error("no supported authentication mechanism in {offered:?}")]
    NoAcceptableMethod {
        /// Method codes the client offered, in client order
        offered: Vec<u8>,
    },

    /// Credentials were rejected; terminal, never retried on this connection
    #[error("user authentication failed")]
    AuthenticationFailed,

    /// Request carried a command the server does not implement
    #[error("command not supported: {0}")]
    CommandNotSupported(u8),

    /// Request carried an unknown ATYP byte
    #[error("address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Egress policy rejected the destination
    #[error("connection to {dest} not allowed by policy")]
    NotAllowed {
        /// Destination that was rejected
        dest: String,
    },

    /// Name resolution failed for a domain target
    #[error("failed to resolve {domain}: {source}")]
    Resolve {
        /// Domain that failed to resolve
        domain: String,
        /// Underlying resolver error
        #[source]
        source: io::Error,
    },

    /// Outbound dial failed; `code` is the reply derived from the error kind
    #[error("connect failed: {source}")]
    Dial {
        /// Reply code reflecting the dial failure
        code: ReplyCode,
        /// Underlying connect error
        #[source]
        source: io::Error,
    },

    /// Outbound dial did not complete within the configured timeout
    #[error("connect timed out")]
    ConnectTimeout,

    /// IO error while reading or writing a protocol frame
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Socks5Error {
    /// Construct a [`Socks5Error::Dial`] from a connect error, deriving the
    /// reply code from the error kind.
    pub fn dial(source: io::Error) -> Self {
        Socks5Error::Dial {
            code: ReplyCode::from(&source),
            source,
        }
    }

    /// The reply still owed to the client for this error, if any.
    ///
    /// `None` means no reply frame should be written: either the negotiation
    /// layer already answered on the wire in its own frame format, or the
    /// peer is gone.
    pub fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            Socks5Error::UnsupportedVersion(_) | Socks5Error::Protocol(_) => {
                Some(ReplyCode::GeneralFailure)
            }
            Socks5Error::CommandNotSupported(_) => Some(ReplyCode::CommandNotSupported),
            Socks5Error::AddressTypeNotSupported(_) => Some(ReplyCode::AddressTypeNotSupported),
            Socks5Error::NotAllowed { .. } => Some(ReplyCode::ConnectionNotAllowed),
            Socks5Error::Resolve { .. } => Some(ReplyCode::HostUnreachable),
            Socks5Error::Dial { code, .. } => Some(*code),
            Socks5Error::ConnectTimeout => Some(ReplyCode::HostUnreachable),
            Socks5Error::NoAcceptableMethod { .. }
            | Socks5Error::UnsupportedAuthVersion(_)
            | Socks5Error::AuthenticationFailed
            | Socks5Error::Io(_) => None,
        }
    }
}

/// Reply codes for the SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<ReplyCode> for u8 {
    fn from(code: ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for ReplyCode {
    type Error = Socks5Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ReplyCode::Succeeded),
            0x01 => Ok(ReplyCode::GeneralFailure),
            0x02 => Ok(ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(ReplyCode::NetworkUnreachable),
            0x04 => Ok(ReplyCode::HostUnreachable),
            0x05 => Ok(ReplyCode::ConnectionRefused),
            0x06 => Ok(ReplyCode::TtlExpired),
            0x07 => Ok(ReplyCode::CommandNotSupported),
            0x08 => Ok(ReplyCode::AddressTypeNotSupported),
            other => Err(Socks5Error::Protocol(format!(
                "unknown reply code: {other:#04x}"
            ))),
        }
    }
}

impl From<&io::Error> for ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ReplyCode::ConnectionRefused,
            io::ErrorKind::NetworkUnreachable => ReplyCode::NetworkUnreachable,
            io::ErrorKind::HostUnreachable
            | io::ErrorKind::TimedOut
            | io::ErrorKind::AddrNotAvailable => ReplyCode::HostUnreachable,
            io::ErrorKind::PermissionDenied => ReplyCode::ConnectionNotAllowed,
            _ => ReplyCode::GeneralFailure,
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplyCode::Succeeded => "succeeded",
            ReplyCode::GeneralFailure => "general failure",
            ReplyCode::ConnectionNotAllowed => "connection not allowed",
            ReplyCode::NetworkUnreachable => "network unreachable",
            ReplyCode::HostUnreachable => "host unreachable",
            ReplyCode::ConnectionRefused => "connection refused",
            ReplyCode::TtlExpired => "TTL expired",
            ReplyCode::CommandNotSupported => "command not supported",
            ReplyCode::AddressTypeNotSupported => "address type not supported",
        };
        f.write_str(name)
    }
}
