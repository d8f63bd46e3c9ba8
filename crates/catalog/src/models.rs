//! Row types for the SQL backend.

use gantry_core::{Album, AlbumVideo, StoredObject, Video};
use time::OffsetDateTime;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AlbumRow {
    pub uid: String,
    pub provider_id: String,
    pub database_id: String,
    pub user_id: String,
    pub album_uid: String,
    pub synced: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<AlbumRow> for Album {
    fn from(row: AlbumRow) -> Self {
        Album {
            uid: row.uid,
            provider_id: row.provider_id,
            database_id: row.database_id,
            user_id: row.user_id,
            album_uid: row.album_uid,
            synced: row.synced,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AlbumVideoRow {
    pub provider_id: String,
    pub database_id: String,
    pub album_uid: String,
    pub video_uid: String,
}

impl From<AlbumVideoRow> for AlbumVideo {
    fn from(row: AlbumVideoRow) -> Self {
        AlbumVideo {
            provider_id: row.provider_id,
            database_id: row.database_id,
            album_uid: row.album_uid,
            video_uid: row.video_uid,
        }
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct VideoRow {
    pub uid: String,
    pub provider_id: String,
    pub database_id: String,
    pub user_id: String,
    pub video_uid: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Video {
            uid: row.uid,
            provider_id: row.provider_id,
            database_id: row.database_id,
            user_id: row.user_id,
            video_uid: row.video_uid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ObjectRow {
    pub uid: String,
    pub provider_id: String,
    pub database_id: String,
    pub video_uid: String,
    pub storage_key: String,
    pub size_bytes: i64,
    pub checksum: String,
    pub created_at: OffsetDateTime,
}

impl From<ObjectRow> for StoredObject {
    fn from(row: ObjectRow) -> Self {
        StoredObject {
            uid: row.uid,
            provider_id: row.provider_id,
            database_id: row.database_id,
            video_uid: row.video_uid,
            storage_key: row.storage_key,
            size_bytes: row.size_bytes,
            checksum: row.checksum,
            created_at: row.created_at,
        }
    }
}
