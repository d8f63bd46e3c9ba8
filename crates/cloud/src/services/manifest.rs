//! Manifest-upload stage, cloud side.

use gantry_catalog::{CatalogError, CatalogStore};
use gantry_core::messages::{
    AlbumManifestUploadRequest, METADATA_PROVIDER_ID, TOPIC_VIDEO_UPLOAD, VideoUploadPayload,
};
use gantry_core::{Album, AlbumVideo, Clock};
use gantry_queue::{Message, Queue, QueueError};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    /// The album already exists under a different user. Surfaces as 409.
    #[error("user ID mismatch for existing album")]
    UserMismatch,

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("serializing payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Accepts a manifest snapshot from the agent and decides whether the
/// stored manifest changes and whether a transfer round is needed.
///
/// The rules:
/// - first write creates the album (`synced = true`) and emits exactly one
///   `videoupload`;
/// - an existing album under a different user is rejected, the stored
///   `user_id` never changes;
/// - a set-equal manifest only touches `updated_at`/`synced` and emits no
///   `videoupload`;
/// - a different manifest is replaced atomically and emits exactly one.
pub struct ManifestUploadService {
    catalog: Arc<dyn CatalogStore>,
    queue: Arc<dyn Queue>,
    clock: Arc<dyn Clock>,
}

impl ManifestUploadService {
    pub fn new(catalog: Arc<dyn CatalogStore>, queue: Arc<dyn Queue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            queue,
            clock,
        }
    }

    pub async fn process(&self, req: &AlbumManifestUploadRequest) -> Result<(), ManifestError> {
        let existing = self
            .catalog
            .get_album(&req.provider_id, &req.database_id, &req.album_uid)
            .await?;

        let now = self.clock.now();

        let Some(mut existing) = existing else {
            let album = Album {
                uid: Album::composite_uid(&req.provider_id, &req.database_id, &req.album_uid),
                provider_id: req.provider_id.clone(),
                database_id: req.database_id.clone(),
                user_id: req.user_id.clone(),
                album_uid: req.album_uid.clone(),
                synced: true,
                created_at: now,
                updated_at: now,
            };
            self.catalog.create_album(&album).await?;
            self.store_manifest(req).await?;
            tracing::info!(
                provider_id = %req.provider_id,
                album_uid = %req.album_uid,
                videos = req.video_uids.len(),
                "album created with initial manifest"
            );
            return self.emit_video_upload(req).await;
        };

        if existing.user_id != req.user_id {
            return Err(ManifestError::UserMismatch);
        }

        let current = self
            .catalog
            .get_manifest(&req.provider_id, &req.database_id, &req.album_uid)
            .await?;

        existing.synced = true;
        existing.updated_at = now;

        if manifests_equal(&current, &req.video_uids) {
            // Nothing moved in the vault; no transfer round is owed.
            self.catalog.update_album(&existing).await?;
            return Ok(());
        }

        self.store_manifest(req).await?;
        self.catalog.update_album(&existing).await?;
        tracing::info!(
            provider_id = %req.provider_id,
            album_uid = %req.album_uid,
            videos = req.video_uids.len(),
            "manifest replaced"
        );
        self.emit_video_upload(req).await
    }

    async fn store_manifest(&self, req: &AlbumManifestUploadRequest) -> Result<(), ManifestError> {
        // Duplicates in the incoming list collapse to one membership row.
        let mut seen = HashSet::new();
        let videos: Vec<AlbumVideo> = req
            .video_uids
            .iter()
            .filter(|uid| seen.insert(uid.as_str()))
            .map(|uid| AlbumVideo {
                provider_id: req.provider_id.clone(),
                database_id: req.database_id.clone(),
                album_uid: req.album_uid.clone(),
                video_uid: uid.clone(),
            })
            .collect();

        self.catalog
            .replace_manifest(&req.provider_id, &req.database_id, &req.album_uid, &videos)
            .await?;
        Ok(())
    }

    async fn emit_video_upload(&self, req: &AlbumManifestUploadRequest) -> Result<(), ManifestError> {
        let payload = serde_json::to_vec(&VideoUploadPayload {
            database_id: req.database_id.clone(),
            album_uid: req.album_uid.clone(),
        })?;

        self.queue
            .publish(
                Message::new(TOPIC_VIDEO_UPLOAD, payload)
                    .with_metadata(METADATA_PROVIDER_ID, req.provider_id.clone()),
            )
            .await?;
        Ok(())
    }
}

/// Set equality over video uids; duplicates on either side are ignored.
fn manifests_equal(current: &[AlbumVideo], incoming: &[String]) -> bool {
    let stored: HashSet<&str> = current.iter().map(|v| v.video_uid.as_str()).collect();
    let requested: HashSet<&str> = incoming.iter().map(String::as_str).collect();
    stored == requested
}
