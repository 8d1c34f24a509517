//! Error handling for the uploader
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for the uploader
pub type Result<T> = std::result::Result<T, UploadError>;

/// Main error type for the uploader
#[derive(Error, Debug)]
pub enum UploadError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Destination rejected the upload
    #[error("Upload rejected with status {status}: {body}")]
    Status {
        /// HTTP status code returned by the destination
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Image compression errors
    #[error("Image compression error: {0}")]
    Compression(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upload was cancelled; never recorded as a per-item error
    #[error("Upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// Whether this error represents an explicit cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Cancelled)
    }
}
