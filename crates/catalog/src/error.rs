//! Catalogue store error types.

use thiserror::Error;

/// Catalogue store operation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for catalogue operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
