//! `usersync` consumer: announce a user's albums to the cloud.

use crate::client::CloudClient;
use crate::retry::with_backoff;
use crate::vault::VaultRegistry;
use async_trait::async_trait;
use gantry_core::RETRY_BACKOFF_BASE;
use gantry_core::messages::{SyncUserPayload, UserAlbumsRequest};
use gantry_queue::{HandlerResult, Message, MessageHandler};
use std::sync::Arc;
use std::time::Duration;

pub struct SyncUserConsumer {
    provider_id: String,
    vaults: Arc<dyn VaultRegistry>,
    cloud: Arc<dyn CloudClient>,
    max_retries: u32,
    retry_base: Duration,
}

impl SyncUserConsumer {
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
impl MessageHandler for SyncUserConsumer {
    async fn handle(&self, msg: Message) -> HandlerResult {
        let payload: SyncUserPayload = serde_json::from_slice(&msg.payload)?;

        let vault = self.vaults.get(&payload.database_id)?;
        let album_uids = vault.list_album_uids(&payload.user_id).await?;

        if album_uids.is_empty() {
            // Nothing to do is not an error.
            tracing::warn!(user_id = %payload.user_id, "no albums found for user");
            return Ok(());
        }

        let req = UserAlbumsRequest {
            provider_id: self.provider_id.clone(),
            database_id: payload.database_id.clone(),
            user_id: payload.user_id.clone(),
            album_uids,
        };

        with_backoff(self.max_retries, self.retry_base, || {
            self.cloud.post_user_albums(&req)
        })
        .await?;

        Ok(())
    }
}
