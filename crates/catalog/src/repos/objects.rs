//! Stored-object repository contract.

use crate::error::CatalogResult;
use async_trait::async_trait;
use gantry_core::StoredObject;

#[async_trait]
pub trait ObjectRepo: Send + Sync {
    /// Insert or refresh the stored binary record for a video.
    async fn upsert_object(&self, object: &StoredObject) -> CatalogResult<()>;

    async fn get_object(
        &self,
        provider_id: &str,
        database_id: &str,
        video_uid: &str,
    ) -> CatalogResult<Option<StoredObject>>;

    /// How many of an album's manifest entries have a stored object.
    async fn count_objects_for_album(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
    ) -> CatalogResult<u64>;
}
