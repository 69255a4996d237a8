//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared client result type.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error enumeration covering all session failure modes.
#[derive(Debug)]
pub enum ClientError {
    /// Child process could not be started. Fatal to the session.
    Launch(String),
    /// Malformed inbound line. Logged and skipped by the reader, surfaced
    /// only when a caller parses a line directly.
    Parse(String),
    /// The peer answered a request with an `error` field. Carries the error
    /// payload verbatim.
    Rpc(serde_json::Value),
    /// No matching response arrived within the caller's deadline.
    Timeout(String),
    /// The stream ended or a write failed. Subsequent operations on the
    /// session fail fast with this variant instead of hanging.
    TransportClosed(String),
    /// File-system or I/O operation failure outside the wire protocol.
    Io(String),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Launch(msg) => write!(f, "launch: {msg}"),
            Self::Parse(msg) => write!(f, "parse: {msg}"),
            Self::Rpc(payload) => write!(f, "rpc error: {payload}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::TransportClosed(msg) => write!(f, "transport closed: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
