//! Album repository contract.

use crate::error::CatalogResult;
use async_trait::async_trait;
use gantry_core::Album;

#[async_trait]
pub trait AlbumRepo: Send + Sync {
    /// Look an album up by its tenant-scoped natural key.
    async fn get_album(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
    ) -> CatalogResult<Option<Album>>;

    async fn create_album(&self, album: &Album) -> CatalogResult<()>;

    /// Rewrite an existing album's mutable columns (`user_id`, `synced`,
    /// `updated_at`).
    async fn update_album(&self, album: &Album) -> CatalogResult<()>;

    /// All albums with `synced == false`, across tenants.
    ///
    /// This is the reconciliation scan predicate; it is intentionally no
    /// richer than the flag itself.
    async fn find_albums_needing_repair(&self) -> CatalogResult<Vec<Album>>;
}
