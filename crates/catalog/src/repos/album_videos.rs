//! Manifest (album-video membership) repository contract.

use crate::error::CatalogResult;
use async_trait::async_trait;
use gantry_core::AlbumVideo;

#[async_trait]
pub trait AlbumVideoRepo: Send + Sync {
    /// The stored manifest rows for an album.
    async fn get_manifest(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
    ) -> CatalogResult<Vec<AlbumVideo>>;

    /// Replace an album's manifest as a whole. A partial manifest must
    /// never be observable.
    async fn replace_manifest(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
        videos: &[AlbumVideo],
    ) -> CatalogResult<()>;

    /// Membership check for a single video.
    async fn manifest_contains(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
        video_uid: &str,
    ) -> CatalogResult<bool>;
}
