//! Error types for the telemetry bridge.
//!
//! Every failure the bridge can hit is described by [`BridgeError`]. Socket
//! failures never escape the per-tick boundary of
//! [`StreamingClient`](crate::StreamingClient); they are logged and folded into
//! a [`TickOutcome`](crate::TickOutcome). Configuration and file errors surface
//! to the caller during startup.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: The handshake with the trainer could not be established
//! - **Send Errors**: A write to an established connection failed mid-stream
//! - **Config Errors**: Invalid or unreadable bridge configuration
//! - **Parse Errors**: A telemetry record or YAML document could not be decoded
//! - **Driver Errors**: The background tick loop stopped or could not be joined
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use acrl_bridge::BridgeError;
//!
//! let error = BridgeError::connection_failed("127.0.0.1:65432", "connection refused");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Main error type for bridge operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("Failed to connect to {endpoint}: {reason}")]
    Connection {
        endpoint: String,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Failed to send frame to {endpoint}: {reason}")]
    Send {
        endpoint: String,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Config file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Bridge driver has stopped")]
    Shutdown,

    #[error("Bridge driver failed: {reason}")]
    Driver { reason: String },
}

impl BridgeError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Connection { .. } => true,
            BridgeError::Send { .. } => true,
            BridgeError::Config { .. } => false,
            BridgeError::File { .. } => false,
            BridgeError::Parse { .. } => false,
            BridgeError::Shutdown => false,
            BridgeError::Driver { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BridgeError::Connection { .. } => vec![
                "Ensure the trainer process is running and listening",
                "Check the configured host and port",
                "Press start again once the trainer is up",
            ],
            BridgeError::Send { .. } => vec![
                "Check that the trainer is still reading from the socket",
                "Restart the trainer if it stopped consuming records",
            ],
            BridgeError::Config { .. } => vec![
                "Review the configuration values against the documented ranges",
                "Remove the offending key to fall back to its default",
            ],
            BridgeError::File { .. } => vec![
                "Check the config file exists and is readable",
                "Check file permissions",
            ],
            BridgeError::Parse { .. } => vec![
                "Verify the record was produced by a compatible bridge version",
                "Check the YAML syntax of the configuration file",
            ],
            BridgeError::Shutdown => vec!["Spawn a new driver before sending commands"],
            BridgeError::Driver { .. } => vec![
                "Check the log stream for the panic that stopped the driver",
                "Restart the bridge",
            ],
        }
    }

    /// Helper constructor for connection errors without an IO source.
    pub fn connection_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        BridgeError::Connection { endpoint: endpoint.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors caused by a socket error.
    pub fn connection_io(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        BridgeError::Connection {
            endpoint: endpoint.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// Helper constructor for send errors.
    pub fn send_failed(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        BridgeError::Send {
            endpoint: endpoint.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// Helper constructor for invalid configuration values.
    pub fn config_invalid(reason: impl Into<String>) -> Self {
        BridgeError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        BridgeError::File { path, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        BridgeError::Parse { context: context.into(), details: details.into() }
    }
}

impl From<serde_yaml_ng::Error> for BridgeError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        BridgeError::Parse { context: "config YAML".to_string(), details: err.to_string() }
    }
}
