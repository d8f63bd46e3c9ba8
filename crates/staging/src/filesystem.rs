//! Filesystem staging backend.

use crate::error::{StagingError, StagingResult};
use crate::StagingStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Stages payloads as plain files under a root directory.
pub struct FilesystemStaging {
    root: PathBuf,
}

impl FilesystemStaging {
    /// Create a new filesystem staging store rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> StagingResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Resolve a key to a path, rejecting anything that could escape the
    /// staging root.
    fn key_path(&self, key: &str) -> StagingResult<PathBuf> {
        if key.is_empty() {
            return Err(StagingError::InvalidKey("empty key".to_string()));
        }
        if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StagingError::InvalidKey(format!(
                "path traversal not allowed: {key}"
            )));
        }
        for component in Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => {
                    return Err(StagingError::InvalidKey(format!(
                        "contains unsafe path component: {key}"
                    )));
                }
            }
        }
        Ok(self.root.join(key))
    }

    async fn ensure_parent(&self, path: &Path) -> StagingResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StagingStore for FilesystemStaging {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn store(&self, key: &str, data: Bytes) -> StagingResult<()> {
        let path = self.key_path(key)?;
        self.ensure_parent(&path).await?;

        // Write to a uniquely-named temp file, fsync, then rename, so a
        // crash mid-write never leaves a torn payload behind.
        let temp_name = format!(".tmp.{}", Uuid::new_v4());
        let temp_path = path.with_file_name(
            path.file_name()
                .map(|n| format!("{}{}", n.to_string_lossy(), temp_name))
                .unwrap_or_else(|| temp_name.clone()),
        );
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn load(&self, key: &str) -> StagingResult<Bytes> {
        let path = self.key_path(key)?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StagingError::NotFound(key.to_string())
            } else {
                StagingError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> StagingResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StagingError::Io(e)),
        }
    }
}
