//! `videoupload` consumer: trigger the vault transfer for an album.

use crate::vault::VaultRegistry;
use async_trait::async_trait;
use gantry_core::messages::VideoUploadPayload;
use gantry_queue::{HandlerResult, Message, MessageHandler};
use std::sync::Arc;

/// Invokes the vault's `c_move`; the vault pushes each payload to the
/// receiver on its own. Success here means the transfer round completed,
/// not that every payload was admitted.
pub struct VideoUploadConsumer {
    vaults: Arc<dyn VaultRegistry>,
}

impl VideoUploadConsumer {
    pub fn new(vaults: Arc<dyn VaultRegistry>) -> Self {
        Self { vaults }
    }
}

#[async_trait]
impl MessageHandler for VideoUploadConsumer {
    async fn handle(&self, msg: Message) -> HandlerResult {
        let payload: VideoUploadPayload = serde_json::from_slice(&msg.payload)?;

        let vault = self.vaults.get(&payload.database_id)?;
        vault.c_move(&payload.album_uid).await?;
        Ok(())
    }
}
