//! Video metadata repository contract.

use crate::error::CatalogResult;
use async_trait::async_trait;
use gantry_core::Video;

#[async_trait]
pub trait VideoRepo: Send + Sync {
    /// Insert or refresh a video's metadata.
    async fn upsert_video(&self, video: &Video) -> CatalogResult<()>;

    async fn get_video(
        &self,
        provider_id: &str,
        database_id: &str,
        video_uid: &str,
    ) -> CatalogResult<Option<Video>>;
}
