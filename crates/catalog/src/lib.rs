//! Catalogue store abstraction and implementations for Gantry.
//!
//! This crate provides the cloud catalogue's control-plane data model:
//! - Albums and their synced flag
//! - Manifest (album-video) membership, replaced atomically per album
//! - Per-video metadata
//! - Stored binary object records
//!
//! Two backends share the [`CatalogStore`] contract: an in-memory store for
//! tests and single-process demos, and a SQLite store for durable
//! deployments. The stage services depend only on the contract.

pub mod error;
pub mod memory;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{CatalogError, CatalogResult};
pub use memory::MemoryStore;
pub use repos::{AlbumRepo, AlbumVideoRepo, ObjectRepo, VideoRepo};
pub use store::{CatalogStore, SqliteStore};

use gantry_core::config::CatalogConfig;
use std::sync::Arc;

/// Create a catalogue store from configuration.
pub async fn from_config(config: &CatalogConfig) -> CatalogResult<Arc<dyn CatalogStore>> {
    match config {
        CatalogConfig::Memory => Ok(Arc::new(MemoryStore::new()) as Arc<dyn CatalogStore>),
        CatalogConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn CatalogStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_config_memory() {
        let store = from_config(&CatalogConfig::Memory).await.unwrap();
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn from_config_sqlite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("catalog.db");
        let config = CatalogConfig::Sqlite {
            path: db_path.clone(),
        };

        let store = from_config(&config).await.unwrap();
        store.health_check().await.unwrap();
        assert!(db_path.exists());
    }
}
