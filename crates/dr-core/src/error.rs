//! Shared error type, trimmed to what a consumer of this crate can raise.

use thiserror::Error;

/// Core error type for docrelay
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid connection option value
    #[error("invalid connection option {name}: {message}")]
    InvalidOption { name: String, message: String },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
