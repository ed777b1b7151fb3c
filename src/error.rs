//! Error types for the feed session.
//!
//! Every network or protocol fault a session can hit maps to one variant
//! here. The reconnect supervisor treats all of them the same way; the
//! variants exist so logs and tests can tell the pipeline stages apart.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Host/service lookup failed or yielded no addresses.
    #[error("Resolve failed: {0}")]
    Resolve(String),

    /// No resolved address accepted a TCP connection.
    #[error("Connect failed: {0}")]
    Connect(String),

    /// TLS client handshake failed (certificate or protocol mismatch).
    #[error("TLS handshake failed: {0}")]
    Tls(String),

    /// WebSocket upgrade was rejected or malformed.
    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    /// Writing an outbound message failed.
    #[error("Write failed: {0}")]
    Write(String),

    /// Reading an inbound frame failed or the peer closed the stream.
    #[error("Read failed: {0}")]
    Read(String),

    /// Inbound payload could not be decompressed into text.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Graceful close failed. Logged only, never retried.
    #[error("Close failed: {0}")]
    Close(String),

    /// Session configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The session was shut down while an operation was in flight.
    #[error("Operation cancelled")]
    Cancelled,

    /// The configured reconnect cap was reached.
    #[error("Gave up after {attempts} failed connection attempts")]
    RetriesExhausted {
        /// Number of consecutive failed attempts.
        attempts: u32,
    },
}

impl Error {
    /// Check if this error is the shutdown signal rather than a fault.
    #[must_use]
    #[inline]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Name of the pipeline stage this error belongs to.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Error::Resolve(_) => "resolve",
            Error::Connect(_) => "connect",
            Error::Tls(_) => "tls",
            Error::Handshake(_) => "handshake",
            Error::Write(_) => "write",
            Error::Read(_) => "read",
            Error::Decode(_) => "decode",
            Error::Close(_) => "close",
            Error::InvalidConfig(_) => "config",
            Error::Cancelled => "shutdown",
            Error::RetriesExhausted { .. } => "supervisor",
        }
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::Decode(format!("payload is not valid UTF-8: {err}"))
    }
}
