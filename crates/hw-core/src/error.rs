//! Core error types for hostwatch

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the hostwatch ecosystem
#[derive(Error, Debug)]
pub enum WatchError {
    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-related errors.
///
/// All of these are expected and recoverable: a supervisor reacts to any of
/// them by entering its backoff-reconnect path. None is ever surfaced to a
/// subscriber as anything other than an `offline` status.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connect attempt did not complete in time
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// Connect attempt failed outright
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// Credentials were rejected by the host
    #[error("authentication failed for {0}")]
    AuthFailed(String),

    /// An established session was lost
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The liveness probe could not be executed or reported failure
    #[error("liveness probe failed: {0}")]
    ProbeFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
