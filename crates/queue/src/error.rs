//! Queue error types.

use thiserror::Error;

/// Queue operation errors.
///
/// Publishing never fails for capacity; errors are limited to misuse.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("unknown subscription: {0}")]
    UnknownSubscription(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for queue operations.
pub type QueueResult<T> = std::result::Result<T, QueueError>;
