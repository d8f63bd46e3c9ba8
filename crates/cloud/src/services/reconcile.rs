//! Reconciliation: the eventual-consistency worker and its consumer.

use async_trait::async_trait;
use gantry_catalog::{CatalogError, CatalogStore};
use gantry_core::messages::{
    AlbumManifestUploadPayload, ConsistencyCheckPayload, METADATA_PROVIDER_ID,
    TOPIC_ALBUM_MANIFEST_UPLOAD, TOPIC_CONSISTENCY_CHECK,
};
use gantry_core::{Clock, MAX_REPAIR_ATTEMPTS, REPAIR_BACKOFF_BASE};
use gantry_queue::{HandlerResult, Message, MessageHandler, Queue, QueueError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("serializing payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Periodically scans for unsynced albums and opens a repair cycle for
/// each. The caller owns the interval.
pub struct EventualConsistencyWorker {
    catalog: Arc<dyn CatalogStore>,
    queue: Arc<dyn Queue>,
}

impl EventualConsistencyWorker {
    pub fn new(catalog: Arc<dyn CatalogStore>, queue: Arc<dyn Queue>) -> Self {
        Self { catalog, queue }
    }

    pub async fn scan(&self) -> Result<(), ReconcileError> {
        let albums = self.catalog.find_albums_needing_repair().await?;

        for album in albums {
            let payload = serde_json::to_vec(&ConsistencyCheckPayload {
                provider_id: album.provider_id.clone(),
                database_id: album.database_id.clone(),
                album_uid: album.album_uid.clone(),
                attempt: 1,
            })?;

            self.queue
                .publish(Message::new(TOPIC_CONSISTENCY_CHECK, payload))
                .await?;

            tracing::info!(
                provider_id = %album.provider_id,
                album_uid = %album.album_uid,
                "album needs repair, consistency check queued"
            );
        }

        Ok(())
    }
}

/// Consumes `syncconsistencycheck`: re-drives the manifest stage for one
/// album and reschedules itself with exponential backoff until the album
/// converges or the attempt cap is hit.
pub struct ConsistencyCheckConsumer {
    catalog: Arc<dyn CatalogStore>,
    queue: Arc<dyn Queue>,
    clock: Arc<dyn Clock>,
}

impl ConsistencyCheckConsumer {
    pub fn new(catalog: Arc<dyn CatalogStore>, queue: Arc<dyn Queue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            queue,
            clock,
        }
    }
}

#[async_trait]
impl MessageHandler for ConsistencyCheckConsumer {
    async fn handle(&self, msg: Message) -> HandlerResult {
        let payload: ConsistencyCheckPayload = serde_json::from_slice(&msg.payload)?;

        let album = self
            .catalog
            .get_album(&payload.provider_id, &payload.database_id, &payload.album_uid)
            .await?;

        // A repaired (or vanished) album terminates the cycle.
        let Some(album) = album else { return Ok(()) };
        if album.synced {
            return Ok(());
        }

        if payload.attempt >= MAX_REPAIR_ATTEMPTS {
            // TODO: route to a DLQ so an operator sees abandoned albums
            tracing::warn!(
                provider_id = %payload.provider_id,
                album_uid = %payload.album_uid,
                attempt = payload.attempt,
                "giving up on album repair"
            );
            return Ok(());
        }

        // Re-drive the manifest from the vault's current contents. Existing
        // objects are harmlessly re-upserted; previously-rejected videos now
        // pass membership.
        let manifest_payload = serde_json::to_vec(&AlbumManifestUploadPayload {
            database_id: payload.database_id.clone(),
            album_uid: payload.album_uid.clone(),
        })?;
        self.queue
            .publish(
                Message::new(TOPIC_ALBUM_MANIFEST_UPLOAD, manifest_payload)
                    .with_metadata(METADATA_PROVIDER_ID, payload.provider_id.clone()),
            )
            .await?;

        // Self-reschedule: this is what lets the loop ride out a
        // single-pass failure (vault briefly unreachable, agent restart).
        let next_payload = serde_json::to_vec(&ConsistencyCheckPayload {
            provider_id: payload.provider_id.clone(),
            database_id: payload.database_id.clone(),
            album_uid: payload.album_uid.clone(),
            attempt: payload.attempt + 1,
        })?;

        let backoff = REPAIR_BACKOFF_BASE * (1i32 << (payload.attempt - 1));
        let deliver_at = self.clock.now() + backoff;

        self.queue
            .publish(
                Message::new(TOPIC_CONSISTENCY_CHECK, next_payload).with_deliver_at(deliver_at),
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_catalog::MemoryStore;
    use gantry_core::{Album, ManualClock};
    use gantry_queue::{InMemoryQueue, TickableQueue};
    use time::macros::datetime;

    fn unsynced_album() -> Album {
        let now = datetime!(2024-01-01 12:00 UTC);
        Album {
            uid: "p1-db1-album1".into(),
            provider_id: "p1".into(),
            database_id: "db1".into(),
            user_id: "user1".into(),
            album_uid: "album1".into(),
            synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn scan_publishes_one_check_per_unsynced_album() {
        let catalog: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 12:00 UTC)));
        let queue = Arc::new(InMemoryQueue::new(clock));

        catalog.create_album(&unsynced_album()).await.unwrap();
        let mut synced = unsynced_album();
        synced.album_uid = "album2".into();
        synced.synced = true;
        catalog.create_album(&synced).await.unwrap();

        let worker = EventualConsistencyWorker::new(catalog, queue.clone());
        worker.scan().await.unwrap();

        assert_eq!(queue.pending_count(), 1);
    }

    #[tokio::test]
    async fn consumer_drops_synced_album_without_rescheduling() {
        let catalog: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 12:00 UTC)));
        let queue = Arc::new(InMemoryQueue::new(clock.clone()));

        let mut album = unsynced_album();
        album.synced = true;
        catalog.create_album(&album).await.unwrap();

        let consumer = ConsistencyCheckConsumer::new(catalog, queue.clone(), clock);
        let payload = serde_json::to_vec(&ConsistencyCheckPayload {
            provider_id: "p1".into(),
            database_id: "db1".into(),
            album_uid: "album1".into(),
            attempt: 1,
        })
        .unwrap();
        consumer
            .handle(Message::new(TOPIC_CONSISTENCY_CHECK, payload))
            .await
            .unwrap();

        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn consumer_reemits_manifest_work_and_backs_off() {
        let catalog: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 12:00 UTC)));
        let queue = Arc::new(InMemoryQueue::new(clock.clone()));

        catalog.create_album(&unsynced_album()).await.unwrap();

        let consumer = ConsistencyCheckConsumer::new(catalog, queue.clone(), clock.clone());
        let payload = serde_json::to_vec(&ConsistencyCheckPayload {
            provider_id: "p1".into(),
            database_id: "db1".into(),
            album_uid: "album1".into(),
            attempt: 1,
        })
        .unwrap();
        consumer
            .handle(Message::new(TOPIC_CONSISTENCY_CHECK, payload))
            .await
            .unwrap();

        // One albummanifestupload plus one rescheduled check.
        assert_eq!(queue.pending_count(), 2);

        // The follow-up check is not deliverable until the backoff elapses.
        let (received, handler) = {
            let received = Arc::new(std::sync::Mutex::new(Vec::new()));
            let sink = received.clone();
            let handler = gantry_queue::handler_fn(move |msg: Message| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(msg);
                    Ok(())
                }
            });
            (received, handler)
        };
        queue
            .subscribe("test:check", TOPIC_CONSISTENCY_CHECK, "", handler)
            .await
            .unwrap();

        queue.process().await;
        assert_eq!(received.lock().unwrap().len(), 0);

        clock.advance(time::Duration::seconds(1));
        queue.process().await;
        let got = received.lock().unwrap();
        assert_eq!(got.len(), 1);
        let next: ConsistencyCheckPayload = serde_json::from_slice(&got[0].payload).unwrap();
        assert_eq!(next.attempt, 2);
    }

    #[tokio::test]
    async fn consumer_gives_up_at_attempt_cap() {
        let catalog: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 12:00 UTC)));
        let queue = Arc::new(InMemoryQueue::new(clock.clone()));

        catalog.create_album(&unsynced_album()).await.unwrap();

        let consumer = ConsistencyCheckConsumer::new(catalog, queue.clone(), clock);
        let payload = serde_json::to_vec(&ConsistencyCheckPayload {
            provider_id: "p1".into(),
            database_id: "db1".into(),
            album_uid: "album1".into(),
            attempt: MAX_REPAIR_ATTEMPTS,
        })
        .unwrap();
        consumer
            .handle(Message::new(TOPIC_CONSISTENCY_CHECK, payload))
            .await
            .unwrap();

        assert_eq!(queue.pending_count(), 0);
    }
}
