//! User-albums stage: fan a user's album list out into per-album work.

use async_trait::async_trait;
use gantry_catalog::{CatalogError, CatalogStore};
use gantry_core::messages::{
    AlbumManifestUploadPayload, METADATA_PROVIDER_ID, TOPIC_ALBUM_MANIFEST_UPLOAD,
    UserAlbumsRequest,
};
use gantry_queue::{HandlerResult, Message, MessageHandler, Queue, QueueError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserAlbumsError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("serializing payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Emits one `albummanifestupload` message per album the catalogue has not
/// seen yet. Exhaustive over the request and idempotent: replaying the same
/// request produces no new messages.
pub struct UserAlbumsService {
    catalog: Arc<dyn CatalogStore>,
    queue: Arc<dyn Queue>,
}

impl UserAlbumsService {
    pub fn new(catalog: Arc<dyn CatalogStore>, queue: Arc<dyn Queue>) -> Self {
        Self { catalog, queue }
    }

    pub async fn process(&self, req: &UserAlbumsRequest) -> Result<(), UserAlbumsError> {
        for album_uid in &req.album_uids {
            let existing = self
                .catalog
                .get_album(&req.provider_id, &req.database_id, album_uid)
                .await?;

            if existing.is_some() {
                // Existing albums are re-checked only through the
                // reconciliation path.
                continue;
            }

            let payload = serde_json::to_vec(&AlbumManifestUploadPayload {
                database_id: req.database_id.clone(),
                album_uid: album_uid.clone(),
            })?;

            self.queue
                .publish(
                    Message::new(TOPIC_ALBUM_MANIFEST_UPLOAD, payload)
                        .with_metadata(METADATA_PROVIDER_ID, req.provider_id.clone()),
                )
                .await?;

            tracing::debug!(
                provider_id = %req.provider_id,
                album_uid = %album_uid,
                "queued manifest upload for new album"
            );
        }

        Ok(())
    }
}

/// In-process consumer for the `useralbums` topic.
pub struct UserAlbumsConsumer {
    service: Arc<UserAlbumsService>,
}

impl UserAlbumsConsumer {
    pub fn new(service: Arc<UserAlbumsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MessageHandler for UserAlbumsConsumer {
    async fn handle(&self, msg: Message) -> HandlerResult {
        let req: UserAlbumsRequest = serde_json::from_slice(&msg.payload)?;
        self.service.process(&req).await?;
        Ok(())
    }
}
