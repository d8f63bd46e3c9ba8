//! Durable local staging for in-flight video payloads.
//!
//! The agent's receiver writes every payload here before forwarding it to
//! the cloud, so a terminal upload failure never loses the bytes: the
//! staged file stays behind for a later retry.

pub mod error;
pub mod filesystem;
pub mod memory;

pub use error::{StagingError, StagingResult};
pub use filesystem::FilesystemStaging;
pub use memory::MemoryStaging;

use async_trait::async_trait;
use bytes::Bytes;

/// A flat keyed byte store.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Write a payload under `key`, replacing any previous content.
    async fn store(&self, key: &str, data: Bytes) -> StagingResult<()>;

    /// Read a payload back.
    async fn load(&self, key: &str) -> StagingResult<Bytes>;

    /// Remove a payload. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> StagingResult<()>;
}

/// Build the staging key for one in-flight payload.
pub fn staging_key(provider_id: &str, database_id: &str, album_uid: &str, video_uid: &str) -> String {
    format!("{provider_id}/{database_id}/{album_uid}/{video_uid}")
}
