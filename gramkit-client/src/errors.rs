//! Error types for gramkit-client.
//!
//! Three layers, each convertible into the next with `?`:
//! [`ConnectionError`] (socket and handshake), [`InvocationError`] (one RPC),
//! [`SignInError`] (the interactive login flow).

use std::{fmt, io};

use gramkit_mtproto::{authentication, plain, transport};
use gramkit_tl_types::enums;

// ─── ConnectionError ──────────────────────────────────────────────────────────

/// A fault of the connection itself. Fatal to that connection.
#[derive(Debug)]
pub enum ConnectionError {
    /// The peer closed the stream.
    Closed,
    /// A frame arrived with a CRC32 trailer that does not match its contents.
    Checksum { expected: u32, got: u32 },
    /// Any other framing violation (length, transport seq, status code).
    Framing(transport::Error),
    /// Socket-level failure.
    Io(io::Error),
    /// The auth key exchange was aborted.
    Handshake(authentication::Error),
    /// A plaintext frame during the key exchange could not be decoded.
    Plain(plain::DecodeError),
    /// A plaintext response body was malformed.
    Deserialize(gramkit_tl_types::deserialize::Error),
    /// The peer did not answer in time.
    Timeout,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "connection closed by peer"),
            Self::Checksum { expected, got } => {
                write!(f, "frame checksum mismatch: expected {expected:#010x}, got {got:#010x}")
            }
            Self::Framing(e) => write!(f, "framing: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Handshake(e) => write!(f, "auth key exchange: {e}"),
            Self::Plain(e) => write!(f, "plaintext frame: {e}"),
            Self::Deserialize(e) => write!(f, "plaintext body: {e}"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

impl std::error::Error for ConnectionError {}

// io::Error is not Clone; keep kind and message so a single failure can be
// handed to every request that was waiting on the dead connection.
impl Clone for ConnectionError {
    fn clone(&self) -> Self {
        match self {
            Self::Closed => Self::Closed,
            Self::Checksum { expected, got } => Self::Checksum { expected: *expected, got: *got },
            Self::Framing(e) => Self::Framing(e.clone()),
            Self::Io(e) => Self::Io(io::Error::new(e.kind(), e.to_string())),
            Self::Handshake(e) => Self::Handshake(e.clone()),
            Self::Plain(e) => Self::Plain(e.clone()),
            Self::Deserialize(e) => Self::Deserialize(e.clone()),
            Self::Timeout => Self::Timeout,
        }
    }
}

impl From<io::Error> for ConnectionError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => {
                Self::Closed
            }
            _ => Self::Io(e),
        }
    }
}

impl From<transport::Error> for ConnectionError {
    fn from(e: transport::Error) -> Self {
        match e {
            transport::Error::BadCrc { expected, got } => Self::Checksum { expected, got },
            other => Self::Framing(other),
        }
    }
}

impl From<authentication::Error> for ConnectionError {
    fn from(e: authentication::Error) -> Self {
        Self::Handshake(e)
    }
}

impl From<plain::DecodeError> for ConnectionError {
    fn from(e: plain::DecodeError) -> Self {
        Self::Plain(e)
    }
}

impl From<gramkit_tl_types::deserialize::Error> for ConnectionError {
    fn from(e: gramkit_tl_types::deserialize::Error) -> Self {
        Self::Deserialize(e)
    }
}

// ─── RpcError ─────────────────────────────────────────────────────────────────

/// An `rpc_error` answer, split into a symbolic name and its numeric argument.
///
/// `420 FLOOD_WAIT_30` becomes `code: 420`, `name: "FLOOD_WAIT"`, `value: Some(30)`.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub name: String,
    pub value: Option<u32>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "server error {} {}_{value}", self.code, self.name),
            None => write!(f, "server error {} {}", self.code, self.name),
        }
    }
}

impl std::error::Error for RpcError {}

/// Family of an RPC error, from its status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcErrorKind {
    /// 3xx: send it to another data center.
    Redirect,
    /// 4xx
    BadRequest,
    /// 5xx
    Internal,
    Other,
}

const MIGRATIONS: [&str; 3] = ["PHONE_MIGRATE", "NETWORK_MIGRATE", "USER_MIGRATE"];

impl RpcError {
    /// Split a trailing `_<digits>` off `message` into [`RpcError::value`].
    pub fn from_telegram(code: i32, message: &str) -> Self {
        let split = message
            .rsplit_once('_')
            .filter(|(_, digits)| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|(name, digits)| Some((name, digits.parse::<u32>().ok()?)));
        match split {
            Some((name, value)) => Self { code, name: name.to_owned(), value: Some(value) },
            None => Self { code, name: message.to_owned(), value: None },
        }
    }

    pub(crate) fn from_tl(error: &enums::RpcError) -> Self {
        let enums::RpcError::RpcError(e) = error;
        Self::from_telegram(e.error_code, &e.error_message)
    }

    /// Compare the name with `pattern`. A leading or trailing `*` matches any
    /// suffix or prefix: `"PHONE_CODE_*"`, `"*_MIGRATE"`.
    pub fn is(&self, pattern: &str) -> bool {
        match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
            (_, Some(head)) => self.name.starts_with(head),
            (Some(tail), None) => self.name.ends_with(tail),
            (None, None) => self.name == pattern,
        }
    }

    pub fn kind(&self) -> RpcErrorKind {
        match self.code / 100 {
            3 => RpcErrorKind::Redirect,
            4 => RpcErrorKind::BadRequest,
            5 => RpcErrorKind::Internal,
            _ => RpcErrorKind::Other,
        }
    }

    /// Seconds to wait, for a `420 FLOOD_WAIT_N`.
    pub fn flood_wait_seconds(&self) -> Option<u64> {
        (self.code == 420 && self.name == "FLOOD_WAIT")
            .then_some(self.value)
            .flatten()
            .map(u64::from)
    }

    /// Home data center named by a phone, network or user migration.
    pub fn migrate_dc(&self) -> Option<i32> {
        let redirect = self.kind() == RpcErrorKind::Redirect && MIGRATIONS.contains(&self.name.as_str());
        self.value.filter(|_| redirect).map(|dc| dc as i32)
    }
}

// ─── InvocationError ──────────────────────────────────────────────────────────

/// Why a request made through the client did not produce its answer.
#[derive(Debug)]
pub enum InvocationError {
    /// The server answered with `rpc_error`.
    Rpc(RpcError),
    Connection(ConnectionError),
    /// Session storage failed, or a migration target has no known address.
    Io(io::Error),
    /// The answer did not decode as the request's return type.
    Deserialize(String),
    /// `bad_msg_notification` 34, 35, 64 or a code this client does not handle.
    BadMessage { code: i32 },
    /// The sender went away before the answer arrived.
    Dropped,
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc(e) => fmt::Display::fmt(e, f),
            Self::Connection(e) => write!(f, "connection failed: {e}"),
            Self::Io(e) => write!(f, "i/o: {e}"),
            Self::Deserialize(e) => write!(f, "undecodable answer: {e}"),
            Self::BadMessage { code } => write!(f, "message refused by server (code {code})"),
            Self::Dropped => f.write_str("request abandoned before an answer arrived"),
        }
    }
}

impl std::error::Error for InvocationError {}

impl From<io::Error> for InvocationError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ConnectionError> for InvocationError {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}

impl From<gramkit_tl_types::deserialize::Error> for InvocationError {
    fn from(e: gramkit_tl_types::deserialize::Error) -> Self {
        Self::Deserialize(e.to_string())
    }
}

impl InvocationError {
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(e) => Some(e),
            _ => None,
        }
    }

    /// [`RpcError::is`] when this is a server error; `false` otherwise.
    pub fn is(&self, pattern: &str) -> bool {
        self.rpc().is_some_and(|e| e.is(pattern))
    }

    pub fn flood_wait_seconds(&self) -> Option<u64> {
        self.rpc().and_then(RpcError::flood_wait_seconds)
    }

    pub fn migrate_dc(&self) -> Option<i32> {
        self.rpc().and_then(RpcError::migrate_dc)
    }
}

// ─── SignInError ──────────────────────────────────────────────────────────────

/// Errors returned by [`crate::Client::start`].
#[derive(Debug)]
pub enum SignInError {
    /// The phone number is not registered and the consent callback declined to sign up.
    SignUpRequired { terms_of_service: Option<enums::help::TermsOfService> },
    /// The account has 2FA enabled (`SESSION_PASSWORD_NEEDED`).
    PasswordRequired,
    /// The code entered was wrong or has expired.
    InvalidCode,
    /// Any other error.
    Other(InvocationError),
}

impl fmt::Display for SignInError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignUpRequired { .. } => write!(f, "sign up required"),
            Self::PasswordRequired      => write!(f, "2FA password required"),
            Self::InvalidCode           => write!(f, "invalid or expired code"),
            Self::Other(e)              => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SignInError {}

impl From<InvocationError> for SignInError {
    fn from(e: InvocationError) -> Self { Self::Other(e) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_suffix_is_split() {
        let e = RpcError::from_telegram(420, "FLOOD_WAIT_30");
        assert_eq!(e.name, "FLOOD_WAIT");
        assert_eq!(e.value, Some(30));
        assert_eq!(e.flood_wait_seconds(), Some(30));
        assert_eq!(e.kind(), RpcErrorKind::BadRequest);
    }

    #[test]
    fn wildcards() {
        let e = RpcError::from_telegram(400, "PHONE_CODE_INVALID");
        assert!(e.is("PHONE_CODE_*"));
        assert!(e.is("*_INVALID"));
        assert!(!e.is("PHONE_CODE"));
        assert_eq!(e.value, None);
    }

    #[test]
    fn migrate_redirects() {
        assert_eq!(RpcError::from_telegram(303, "PHONE_MIGRATE_4").migrate_dc(), Some(4));
        assert_eq!(RpcError::from_telegram(303, "USER_MIGRATE_2").migrate_dc(), Some(2));
        assert_eq!(RpcError::from_telegram(303, "FILE_MIGRATE_2").migrate_dc(), None);
        assert_eq!(RpcError::from_telegram(400, "PHONE_MIGRATE_4").migrate_dc(), None);
    }

    #[test]
    fn eof_maps_to_closed() {
        let e = ConnectionError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(e, ConnectionError::Closed));
        let e = ConnectionError::from(transport::Error::BadCrc { expected: 1, got: 2 });
        assert!(matches!(e, ConnectionError::Checksum { expected: 1, got: 2 }));
    }
}
