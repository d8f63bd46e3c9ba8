//! Shared fakes for the agent test suites.

use async_trait::async_trait;
use bytes::Bytes;
use gantry_agent::client::{ClientError, CloudClient};
use gantry_agent::vault::{MediaVault, VaultRegistry, VaultResult};
use gantry_core::messages::{
    AlbumManifestUploadRequest, UserAlbumsRequest, VideoUploadRequest,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// A vault with fixed topology and recorded transfers.
#[derive(Default)]
pub struct FakeVault {
    pub albums_by_user: HashMap<String, Vec<String>>,
    pub videos_by_album: Mutex<HashMap<String, Vec<String>>>,
    pub users_by_album: HashMap<String, String>,
    pub cmove_calls: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaVault for FakeVault {
    async fn list_album_uids(&self, user_id: &str) -> VaultResult<Vec<String>> {
        Ok(self.albums_by_user.get(user_id).cloned().unwrap_or_default())
    }

    async fn list_video_uids(&self, album_uid: &str) -> VaultResult<Vec<String>> {
        Ok(self
            .videos_by_album
            .lock()
            .unwrap()
            .get(album_uid)
            .cloned()
            .unwrap_or_default())
    }

    async fn user_id_for_album(&self, album_uid: &str) -> VaultResult<String> {
        Ok(self.users_by_album.get(album_uid).cloned().unwrap_or_default())
    }

    async fn c_move(&self, album_uid: &str) -> VaultResult<()> {
        self.cmove_calls.lock().unwrap().push(album_uid.to_string());
        Ok(())
    }
}

/// Registry that hands out the same fake vault for every database.
pub struct FakeRegistry {
    pub vault: Arc<FakeVault>,
}

impl VaultRegistry for FakeRegistry {
    fn get(&self, _database_id: &str) -> VaultResult<Arc<dyn MediaVault>> {
        Ok(self.vault.clone() as Arc<dyn MediaVault>)
    }
}

/// A cloud client that records requests and can be scripted to fail.
#[derive(Default)]
pub struct FakeCloudClient {
    pub user_albums: Mutex<Vec<UserAlbumsRequest>>,
    pub manifests: Mutex<Vec<AlbumManifestUploadRequest>>,
    pub videos: Mutex<Vec<(VideoUploadRequest, Bytes)>>,
    /// Fail this many calls (any endpoint) with a 503 before succeeding.
    pub fail_next: AtomicU32,
    /// Always reject video uploads as not-in-manifest.
    pub reject_videos: std::sync::atomic::AtomicBool,
}

impl FakeCloudClient {
    fn maybe_fail(&self) -> Result<(), ClientError> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::UnexpectedStatus(503));
        }
        Ok(())
    }
}

#[async_trait]
impl CloudClient for FakeCloudClient {
    async fn post_user_albums(&self, req: &UserAlbumsRequest) -> Result<(), ClientError> {
        self.maybe_fail()?;
        self.user_albums.lock().unwrap().push(req.clone());
        Ok(())
    }

    async fn post_album_manifest_upload(
        &self,
        req: &AlbumManifestUploadRequest,
    ) -> Result<(), ClientError> {
        self.maybe_fail()?;
        self.manifests.lock().unwrap().push(req.clone());
        Ok(())
    }

    async fn post_video_upload(&self, req: &VideoUploadRequest) -> Result<(), ClientError> {
        self.maybe_fail()?;
        if self.reject_videos.load(Ordering::SeqCst) {
            return Err(ClientError::NotInManifest);
        }
        self.videos
            .lock()
            .unwrap()
            .push((req.clone(), Bytes::from(req.data.clone())));
        Ok(())
    }
}
