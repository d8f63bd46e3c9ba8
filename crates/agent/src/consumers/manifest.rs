//! `albummanifestupload` consumer: snapshot and upload one album's
//! manifest.
//!
//! The snapshot is taken here, not earlier in the pipeline: this is the
//! moment the cloud manifest is defined.

use crate::client::CloudClient;
use crate::retry::with_backoff;
use crate::vault::VaultRegistry;
use async_trait::async_trait;
use gantry_core::RETRY_BACKOFF_BASE;
use gantry_core::messages::{AlbumManifestUploadPayload, AlbumManifestUploadRequest};
use gantry_queue::{HandlerResult, Message, MessageHandler};
use std::sync::Arc;
use std::time::Duration;

pub struct AlbumManifestUploadConsumer {
    provider_id: String,
    vaults: Arc<dyn VaultRegistry>,
    cloud: Arc<dyn CloudClient>,
    max_retries: u32,
    retry_base: Duration,
}

impl AlbumManifestUploadConsumer {
    pub fn new(
        provider_id: impl Into<String>,
        vaults: Arc<dyn VaultRegistry>,
        cloud: Arc<dyn CloudClient>,
        max_retries: u32,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            vaults,
            cloud,
            max_retries: max_retries.max(1),
            retry_base: RETRY_BACKOFF_BASE,
        }
    }

    /// Override the retry backoff base. For tests.
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }
}

#[async_trait]
impl MessageHandler for AlbumManifestUploadConsumer {
    async fn handle(&self, msg: Message) -> HandlerResult {
        let payload: AlbumManifestUploadPayload = serde_json::from_slice(&msg.payload)?;

        let vault = self.vaults.get(&payload.database_id)?;
        let video_uids = vault.list_video_uids(&payload.album_uid).await?;
        let user_id = vault.user_id_for_album(&payload.album_uid).await?;

        let req = AlbumManifestUploadRequest {
            provider_id: self.provider_id.clone(),
            database_id: payload.database_id.clone(),
            user_id,
            album_uid: payload.album_uid.clone(),
            video_uids,
        };

        with_backoff(self.max_retries, self.retry_base, || {
            self.cloud.post_album_manifest_upload(&req)
        })
        .await?;

        tracing::debug!(
            album_uid = %payload.album_uid,
            videos = req.video_uids.len(),
            "manifest snapshot uploaded"
        );
        Ok(())
    }
}
