//! Error types shared across the core crate.

use thiserror::Error;

/// A stroke color string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Color must start with '#': {0}")]
    MissingHash(String),
    #[error("Color must have 3, 6 or 8 hex digits: {0}")]
    BadLength(String),
    #[error("Invalid hex digit in color: {0}")]
    BadDigit(String),
}

/// Wire protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Connection failed: {0}")]
    ConnectFailed(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
