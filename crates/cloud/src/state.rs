//! Application state shared across handlers.

use crate::services::{
    ConsistencyCheckConsumer, EventualConsistencyWorker, ManifestUploadService, UserAlbumsConsumer,
    UserAlbumsService, VideoAdmissionService,
};
use gantry_catalog::CatalogStore;
use gantry_core::config::CloudConfig;
use gantry_core::messages::{TOPIC_CONSISTENCY_CHECK, TOPIC_USER_ALBUMS};
use gantry_core::Clock;
use gantry_queue::{Queue, QueueResult};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<CloudConfig>,
    /// Catalogue store.
    pub catalog: Arc<dyn CatalogStore>,
    /// The message bus shared with the agent.
    pub queue: Arc<dyn Queue>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// User-albums fan-out stage.
    pub user_albums: Arc<UserAlbumsService>,
    /// Manifest-upload stage.
    pub manifest: Arc<ManifestUploadService>,
    /// Video admission stage.
    pub admission: Arc<VideoAdmissionService>,
}

impl AppState {
    /// Create a new application state and wire the stage services.
    ///
    /// # Panics
    ///
    /// Panics if configuration validation fails; the binary validates
    /// before reaching this point.
    pub fn new(
        config: CloudConfig,
        catalog: Arc<dyn CatalogStore>,
        queue: Arc<dyn Queue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if let Err(error) = config.validate() {
            panic!("invalid cloud configuration: {error}");
        }

        let user_albums = Arc::new(UserAlbumsService::new(catalog.clone(), queue.clone()));
        let manifest = Arc::new(ManifestUploadService::new(
            catalog.clone(),
            queue.clone(),
            clock.clone(),
        ));
        let admission = Arc::new(VideoAdmissionService::new(catalog.clone(), clock.clone()));

        Self {
            config: Arc::new(config),
            catalog,
            queue,
            clock,
            user_albums,
            manifest,
            admission,
        }
    }

    /// Build the reconciliation worker over this state's catalogue.
    pub fn consistency_worker(&self) -> EventualConsistencyWorker {
        EventualConsistencyWorker::new(self.catalog.clone(), self.queue.clone())
    }

    /// Register the cloud-side queue consumers.
    ///
    /// Both subscribe with an empty provider filter: `useralbums` is an
    /// in-process cloud topic, and consistency checks carry the provider
    /// inside the payload.
    pub async fn subscribe_consumers(&self) -> QueueResult<()> {
        self.queue
            .subscribe(
                "cloud:useralbums",
                TOPIC_USER_ALBUMS,
                "",
                Arc::new(UserAlbumsConsumer::new(self.user_albums.clone())),
            )
            .await?;

        self.queue
            .subscribe(
                "cloud:syncconsistencycheck",
                TOPIC_CONSISTENCY_CHECK,
                "",
                Arc::new(ConsistencyCheckConsumer::new(
                    self.catalog.clone(),
                    self.queue.clone(),
                    self.clock.clone(),
                )),
            )
            .await?;

        Ok(())
    }
}
