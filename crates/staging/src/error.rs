//! Staging store error types.

use thiserror::Error;

/// Staging store operation errors.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for staging operations.
pub type StagingResult<T> = std::result::Result<T, StagingError>;
