//! Application error types for survey-sync
//!
//! This module defines the error types used throughout the crate.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Errors returned from upload attempts
///
/// Every failure an uploader can produce must be mapped into one of these
/// kinds before it reaches the engine's state-transition logic. Unmapped
/// failures collapse to [`UploadError::Unknown`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UploadError {
    /// Host unreachable; no request left the device
    #[error("No internet connection")]
    NoInternet,

    /// Request dispatched but no response within the transport deadline
    #[error("Network timeout")]
    Timeout,

    /// The server responded with a non-success status code
    #[error("Server error: HTTP {code}")]
    ServerError {
        /// HTTP status code
        code: u16,
        /// Response body, when the server sent one
        message: Option<String>,
    },

    /// Payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other failure
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Store-related errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection-level error from the async driver
    #[error("Database connection error: {0}")]
    Connection(String),
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => StoreError::Sqlite(e),
            other => StoreError::Connection(other.to_string()),
        }
    }
}

/// Trait for determining if an error is retryable
pub trait RetryableError {
    /// Returns true if the error is retryable
    fn is_retryable(&self) -> bool;
}

impl RetryableError for UploadError {
    fn is_retryable(&self) -> bool {
        match self {
            // Retryable errors
            UploadError::NoInternet => true,
            UploadError::Timeout => true,
            UploadError::ServerError { code, .. } => (500..=599).contains(code),

            // Non-retryable errors
            UploadError::Serialization(_) => false,
            UploadError::Unknown(_) => false,
        }
    }
}
