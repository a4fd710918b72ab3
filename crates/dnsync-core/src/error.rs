//! Error types for the dnsync engine
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dnsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dnsync engine
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed name, type, ttl, priority, status or value
    #[error("Validation error: {0}")]
    Validation(String),

    /// Zone, record or forward zone absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate name, stale version, or zone still referenced by records
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller lacks the permission required by the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The first sync of a newly created record failed
    ///
    /// The record row and its change-log entry are persisted before this
    /// error is returned.
    #[error("Protocol error for record {record_id}: {message}")]
    Protocol {
        /// Id of the persisted record
        record_id: u64,
        /// Human-readable sync message
        message: String,
        /// Diagnostic output of the update client
        stderr: String,
    },

    /// Store-related errors
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error was raised before anything was persisted
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::Conflict(_) | Self::Forbidden(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
