//! Media vault access.
//!
//! The vault is the on-prem source of truth for album membership and the
//! originator of binary payloads. This module provides the trait the
//! consumers program against, plus a simulated vault backed by a JSON
//! topology file. The file is re-read on every call so external changes
//! (and tests mutating the topology) are always observed.

use crate::sender::VideoSender;
use async_trait::async_trait;
use bytes::Bytes;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Simulated payload size pushed per video (2 MiB).
pub const DEFAULT_PAYLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("reading vault config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing vault config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("sending video {video_uid}: {source}")]
    Transfer {
        video_uid: String,
        #[source]
        source: crate::sender::SenderError,
    },
}

/// Result type for vault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;

/// One database's media vault.
#[async_trait]
pub trait MediaVault: Send + Sync {
    /// Album uids belonging to a user. Unknown users yield an empty list.
    async fn list_album_uids(&self, user_id: &str) -> VaultResult<Vec<String>>;

    /// The album's current video list. This is the manifest snapshot.
    async fn list_video_uids(&self, album_uid: &str) -> VaultResult<Vec<String>>;

    /// The user an album belongs to. Unknown albums yield an empty string.
    async fn user_id_for_album(&self, album_uid: &str) -> VaultResult<String>;

    /// Push every payload of the album to the configured receiver.
    async fn c_move(&self, album_uid: &str) -> VaultResult<()>;
}

/// Resolves the vault handle for a database.
pub trait VaultRegistry: Send + Sync {
    fn get(&self, database_id: &str) -> VaultResult<Arc<dyn MediaVault>>;
}

// Topology file shape. Field names match the JSON the agent has always
// consumed.

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VaultTopology {
    pub providers: Vec<ProviderTopology>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderTopology {
    #[serde(rename = "providerID")]
    pub provider_id: String,
    pub databases: Vec<DatabaseTopology>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseTopology {
    #[serde(rename = "databaseID")]
    pub database_id: String,
    pub users: Vec<UserTopology>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserTopology {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub albums: Vec<AlbumTopology>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlbumTopology {
    #[serde(rename = "albumUID")]
    pub album_uid: String,
    pub videos: Vec<String>,
}

/// A vault scoped to one database inside the topology file.
pub struct FileVault {
    config_path: PathBuf,
    database_id: String,
    sender: Arc<dyn VideoSender>,
    payload_bytes: usize,
}

impl FileVault {
    async fn read_topology(&self) -> VaultResult<VaultTopology> {
        let data = tokio::fs::read(&self.config_path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn find_user<'a>(&self, topology: &'a VaultTopology, user_id: &str) -> Option<&'a UserTopology> {
        topology
            .providers
            .iter()
            .flat_map(|p| &p.databases)
            .filter(|db| db.database_id == self.database_id)
            .flat_map(|db| &db.users)
            .find(|user| user.user_id == user_id)
    }

    fn find_album<'a>(
        &self,
        topology: &'a VaultTopology,
        album_uid: &str,
    ) -> Option<(&'a AlbumTopology, &'a UserTopology)> {
        topology
            .providers
            .iter()
            .flat_map(|p| &p.databases)
            .filter(|db| db.database_id == self.database_id)
            .flat_map(|db| &db.users)
            .find_map(|user| {
                user.albums
                    .iter()
                    .find(|album| album.album_uid == album_uid)
                    .map(|album| (album, user))
            })
    }
}

#[async_trait]
impl MediaVault for FileVault {
    async fn list_album_uids(&self, user_id: &str) -> VaultResult<Vec<String>> {
        let topology = self.read_topology().await?;
        Ok(self
            .find_user(&topology, user_id)
            .map(|user| user.albums.iter().map(|a| a.album_uid.clone()).collect())
            .unwrap_or_default())
    }

    async fn list_video_uids(&self, album_uid: &str) -> VaultResult<Vec<String>> {
        let topology = self.read_topology().await?;
        Ok(self
            .find_album(&topology, album_uid)
            .map(|(album, _)| album.videos.clone())
            .unwrap_or_default())
    }

    async fn user_id_for_album(&self, album_uid: &str) -> VaultResult<String> {
        let topology = self.read_topology().await?;
        Ok(self
            .find_album(&topology, album_uid)
            .map(|(_, user)| user.user_id.clone())
            .unwrap_or_default())
    }

    async fn c_move(&self, album_uid: &str) -> VaultResult<()> {
        let topology = self.read_topology().await?;
        let Some((album, _)) = self.find_album(&topology, album_uid) else {
            return Ok(());
        };

        for video_uid in &album.videos {
            let mut data = vec![0u8; self.payload_bytes];
            rand::thread_rng().fill_bytes(&mut data);

            self.sender
                .send_video(&self.database_id, album_uid, video_uid, Bytes::from(data))
                .await
                .map_err(|source| VaultError::Transfer {
                    video_uid: video_uid.clone(),
                    source,
                })?;
        }

        Ok(())
    }
}

/// Registry over the topology file: one lazily-created vault handle per
/// database, under a read-biased lock.
pub struct FileVaultRegistry {
    vaults: RwLock<HashMap<String, Arc<dyn MediaVault>>>,
    config_path: PathBuf,
    sender: Arc<dyn VideoSender>,
    payload_bytes: usize,
}

impl FileVaultRegistry {
    pub fn new(config_path: impl AsRef<Path>, sender: Arc<dyn VideoSender>) -> Self {
        Self {
            vaults: RwLock::new(HashMap::new()),
            config_path: config_path.as_ref().to_path_buf(),
            sender,
            payload_bytes: DEFAULT_PAYLOAD_BYTES,
        }
    }

    /// Override the simulated payload size. For tests.
    pub fn with_payload_bytes(mut self, payload_bytes: usize) -> Self {
        self.payload_bytes = payload_bytes;
        self
    }
}

impl VaultRegistry for FileVaultRegistry {
    fn get(&self, database_id: &str) -> VaultResult<Arc<dyn MediaVault>> {
        if let Some(vault) = self.vaults.read().unwrap().get(database_id) {
            return Ok(vault.clone());
        }

        let mut vaults = self.vaults.write().unwrap();
        if let Some(vault) = vaults.get(database_id) {
            return Ok(vault.clone());
        }

        let vault: Arc<dyn MediaVault> = Arc::new(FileVault {
            config_path: self.config_path.clone(),
            database_id: database_id.to_string(),
            sender: self.sender.clone(),
            payload_bytes: self.payload_bytes,
        });
        vaults.insert(database_id.to_string(), vault.clone());
        Ok(vault)
    }
}
