//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required configuration is missing or invalid. Fatal, raised before any request.
    #[error("configuration error: {0}")]
    Config(String),

    /// Config file was present but could not be read or parsed.
    #[error("config file {path}: {reason}")]
    ConfigFile { path: String, reason: String },

    /// Transport failure (connect, TLS, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The remote API answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A 2xx response whose body was not valid JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl SyncError {
    /// Returns true for setup errors that abort a run before any network call.
    pub fn is_config(&self) -> bool {
        matches!(self, SyncError::Config(_) | SyncError::ConfigFile { .. })
    }

    /// Returns the HTTP status if the remote API rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
