//! Crate-level error type
//!
//! Errors that escape a component: binding the listener, loading the
//! configuration, the WebSocket handshake. Per-event failures (room full,
//! unparsable SDP, unreachable peer) have their own types and never end a
//! connection.

use std::fmt;

use tokio_tungstenite::tungstenite;

/// Error type for server and configuration operations
#[derive(Debug)]
pub enum Error {
    /// Socket or file I/O failure
    Io(std::io::Error),
    /// JSON (de)serialization failure
    Json(serde_json::Error),
    /// WebSocket protocol failure
    WebSocket(tungstenite::Error),
    /// Invalid configuration value
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::WebSocket(e) => write!(f, "WebSocket error: {}", e),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::WebSocket(e) => Some(e),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<tungstenite::Error> for Error {
    fn from(err: tungstenite::Error) -> Self {
        Error::WebSocket(err)
    }
}

/// Result alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;
