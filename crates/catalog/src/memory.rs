//! In-memory catalogue store.

use crate::error::{CatalogError, CatalogResult};
use crate::repos::{AlbumRepo, AlbumVideoRepo, ObjectRepo, VideoRepo};
use crate::store::CatalogStore;
use async_trait::async_trait;
use gantry_core::{Album, AlbumVideo, StoredObject, Video};
use std::collections::HashMap;
use std::sync::Mutex;

fn key(provider_id: &str, database_id: &str, local_uid: &str) -> String {
    format!("{provider_id}|{database_id}|{local_uid}")
}

#[derive(Default)]
struct State {
    albums: HashMap<String, Album>,
    manifests: HashMap<String, Vec<AlbumVideo>>,
    videos: HashMap<String, Video>,
    objects: HashMap<String, StoredObject>,
}

/// Mutex-guarded in-memory backend. Manifest replacement is atomic under
/// the single lock.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn migrate(&self) -> CatalogResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> CatalogResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AlbumRepo for MemoryStore {
    async fn get_album(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
    ) -> CatalogResult<Option<Album>> {
        let state = self.state.lock().unwrap();
        Ok(state.albums.get(&key(provider_id, database_id, album_uid)).cloned())
    }

    async fn create_album(&self, album: &Album) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        state.albums.insert(
            key(&album.provider_id, &album.database_id, &album.album_uid),
            album.clone(),
        );
        Ok(())
    }

    async fn update_album(&self, album: &Album) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        let k = key(&album.provider_id, &album.database_id, &album.album_uid);
        if !state.albums.contains_key(&k) {
            return Err(CatalogError::NotFound(format!(
                "album {} not found",
                album.album_uid
            )));
        }
        state.albums.insert(k, album.clone());
        Ok(())
    }

    async fn find_albums_needing_repair(&self) -> CatalogResult<Vec<Album>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .albums
            .values()
            .filter(|album| !album.synced)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AlbumVideoRepo for MemoryStore {
    async fn get_manifest(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
    ) -> CatalogResult<Vec<AlbumVideo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .manifests
            .get(&key(provider_id, database_id, album_uid))
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_manifest(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
        videos: &[AlbumVideo],
    ) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .manifests
            .insert(key(provider_id, database_id, album_uid), videos.to_vec());
        Ok(())
    }

    async fn manifest_contains(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
        video_uid: &str,
    ) -> CatalogResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .manifests
            .get(&key(provider_id, database_id, album_uid))
            .is_some_and(|videos| videos.iter().any(|v| v.video_uid == video_uid)))
    }
}

#[async_trait]
impl VideoRepo for MemoryStore {
    async fn upsert_video(&self, video: &Video) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        let k = key(&video.provider_id, &video.database_id, &video.video_uid);
        match state.videos.get_mut(&k) {
            Some(existing) => {
                existing.user_id = video.user_id.clone();
                existing.updated_at = video.updated_at;
            }
            None => {
                state.videos.insert(k, video.clone());
            }
        }
        Ok(())
    }

    async fn get_video(
        &self,
        provider_id: &str,
        database_id: &str,
        video_uid: &str,
    ) -> CatalogResult<Option<Video>> {
        let state = self.state.lock().unwrap();
        Ok(state.videos.get(&key(provider_id, database_id, video_uid)).cloned())
    }
}

#[async_trait]
impl ObjectRepo for MemoryStore {
    async fn upsert_object(&self, object: &StoredObject) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        state.objects.insert(
            key(&object.provider_id, &object.database_id, &object.video_uid),
            object.clone(),
        );
        Ok(())
    }

    async fn get_object(
        &self,
        provider_id: &str,
        database_id: &str,
        video_uid: &str,
    ) -> CatalogResult<Option<StoredObject>> {
        let state = self.state.lock().unwrap();
        Ok(state.objects.get(&key(provider_id, database_id, video_uid)).cloned())
    }

    async fn count_objects_for_album(
        &self,
        provider_id: &str,
        database_id: &str,
        album_uid: &str,
    ) -> CatalogResult<u64> {
        let state = self.state.lock().unwrap();
        let Some(manifest) = state.manifests.get(&key(provider_id, database_id, album_uid)) else {
            return Ok(0);
        };
        let count = manifest
            .iter()
            .filter(|v| {
                state
                    .objects
                    .contains_key(&key(provider_id, database_id, &v.video_uid))
            })
            .count();
        Ok(count as u64)
    }
}
