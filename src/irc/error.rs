//! IRC connection errors.
//!
//! None of these are fatal to the process: every variant ends the current
//! session, and the client reconnects after a backoff delay.

use thiserror::Error;

use super::codec::CodecError;

#[derive(Debug, Error)]
pub enum IrcError {
    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration failure.
    #[error("TLS error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    /// Framing failure (over-long or unencodable line).
    #[error("protocol framing error: {0}")]
    Codec(#[from] CodecError),

    /// The configured server is not a valid DNS name for TLS.
    #[error("invalid server name for TLS: {0}")]
    InvalidServerName(String),

    /// TCP connect or TLS handshake took too long.
    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),

    /// The server did not finish registration in time.
    #[error("registration timed out")]
    RegistrationTimeout,

    /// Nothing received from the server, even after a keepalive ping.
    #[error("ping timeout")]
    PingTimeout,

    /// The server rejected us or sent `ERROR`.
    #[error("server error: {0}")]
    ServerError(String),

    /// The server closed the connection.
    #[error("connection closed by server")]
    ConnectionClosed,
}
