//! Video-upload stage, cloud side: the admission gate.

use gantry_catalog::{CatalogError, CatalogStore};
use gantry_core::messages::VideoUploadRequest;
use gantry_core::{Checksum, Clock, StoredObject, Video};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The uploaded video is not in the album's stored manifest. Surfaces
    /// as 409 and demotes the album to unsynced.
    #[error("video not in manifest")]
    NotInManifest,

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Admits one video payload into the catalogue.
///
/// The cloud is the authority here: the agent may hold a stale manifest
/// (vault updated between snapshot and transfer), so any video outside the
/// previously-accepted manifest is refused. The rejection flips the album
/// to `synced = false`, which is the signal the reconciliation loop
/// listens for.
pub struct VideoAdmissionService {
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
}

impl VideoAdmissionService {
    pub fn new(catalog: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    pub async fn process(&self, req: &VideoUploadRequest) -> Result<(), AdmissionError> {
        let in_manifest = self
            .catalog
            .manifest_contains(
                &req.provider_id,
                &req.database_id,
                &req.album_uid,
                &req.video_uid,
            )
            .await?;

        if !in_manifest {
            let album = self
                .catalog
                .get_album(&req.provider_id, &req.database_id, &req.album_uid)
                .await?;
            if let Some(mut album) = album {
                album.synced = false;
                album.updated_at = self.clock.now();
                self.catalog.update_album(&album).await?;
                tracing::warn!(
                    provider_id = %req.provider_id,
                    album_uid = %req.album_uid,
                    video_uid = %req.video_uid,
                    "video outside stored manifest, album marked unsynced"
                );
            }
            return Err(AdmissionError::NotInManifest);
        }

        let now = self.clock.now();

        let video = Video {
            uid: Video::composite_uid(&req.provider_id, &req.database_id, &req.video_uid),
            provider_id: req.provider_id.clone(),
            database_id: req.database_id.clone(),
            user_id: req.user_id.clone(),
            video_uid: req.video_uid.clone(),
            created_at: now,
            updated_at: now,
        };
        self.catalog.upsert_video(&video).await?;

        // Hashing is per-payload; large transfers pay for it here.
        let checksum = Checksum::compute(&req.data).to_hex();

        let object = StoredObject {
            uid: StoredObject::composite_uid(&req.provider_id, &req.database_id, &req.video_uid),
            provider_id: req.provider_id.clone(),
            database_id: req.database_id.clone(),
            video_uid: req.video_uid.clone(),
            storage_key: StoredObject::storage_key(
                &req.provider_id,
                &req.database_id,
                &req.video_uid,
            ),
            size_bytes: req.data.len() as i64,
            checksum,
            created_at: now,
        };
        self.catalog.upsert_object(&object).await?;

        tracing::debug!(
            provider_id = %req.provider_id,
            video_uid = %req.video_uid,
            size_bytes = req.data.len(),
            "video admitted"
        );
        Ok(())
    }
}
