/*
[INPUT]:  Failure sources (TCP/DNS, proxy tunnel, WebSocket protocol, payload JSON, heartbeat)
[OUTPUT]: Structured error types with kind tags and recovery hints
[POS]:    Error handling layer - unified error taxonomy for the probe
[UPDATE]: When adding new failure sources or changing recovery policy
*/

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Main error type for the stream probe
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Initial connection or WebSocket handshake failed (DNS, TCP, TLS, upgrade)
    #[error("connect failed: {0}")]
    Connect(String),

    /// HTTP CONNECT tunnel could not be established
    #[error("proxy error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Proxy {
        status: Option<u16>,
        message: String,
    },

    /// Malformed frame or handshake violation
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Payload was not the expected JSON shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Remote or transport initiated close
    #[error("connection closed{}: {reason}", .code.map(|c| format!(" (code {c})")).unwrap_or_default())]
    ConnectionClosed { code: Option<u16>, reason: String },

    /// No pong observed within the heartbeat bound
    #[error("stale heartbeat: no pong for {}ms", .elapsed.as_millis())]
    StaleHeartbeat { elapsed: Duration },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Field-free tag for a [`ProbeError`], used as a structured log value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connect,
    Proxy,
    Protocol,
    Parse,
    ConnectionClosed,
    StaleHeartbeat,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connect => "ConnectError",
            ErrorKind::Proxy => "ProxyError",
            ErrorKind::Protocol => "ProtocolError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::ConnectionClosed => "ConnectionClosed",
            ErrorKind::StaleHeartbeat => "StaleHeartbeat",
            ErrorKind::Config => "ConfigError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::Connect(_) => ErrorKind::Connect,
            ProbeError::Proxy { .. } => ErrorKind::Proxy,
            ProbeError::Protocol(_) => ErrorKind::Protocol,
            ProbeError::Parse(_) => ErrorKind::Parse,
            ProbeError::ConnectionClosed { .. } => ErrorKind::ConnectionClosed,
            ProbeError::StaleHeartbeat { .. } => ErrorKind::StaleHeartbeat,
            ProbeError::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if a session should back off and reconnect after this error
    ///
    /// Only configuration errors are fatal; auth or rate-limit closes still retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProbeError::Config(_))
    }

    /// Check if the error is recovered in place without leaving the stream
    pub fn is_local_recoverable(&self) -> bool {
        matches!(self, ProbeError::Parse(_))
    }

    /// Create a proxy error from a CONNECT response status
    pub fn proxy_status(status: u16, message: impl Into<String>) -> Self {
        ProbeError::Proxy {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn closed(code: Option<u16>, reason: impl Into<String>) -> Self {
        ProbeError::ConnectionClosed {
            code,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for ProbeError {
    fn from(err: url::ParseError) -> Self {
        ProbeError::Config(format!("invalid url: {err}"))
    }
}

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;
