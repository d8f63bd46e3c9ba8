//! Catalogue store trait and the SQLite implementation.

use crate::error::{CatalogError, CatalogResult};
use crate::repos::{AlbumRepo, AlbumVideoRepo, ObjectRepo, VideoRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined catalogue store trait.
#[async_trait]
pub trait CatalogStore: AlbumRepo + AlbumVideoRepo + VideoRepo + ObjectRepo + Send + Sync {
    /// Create or migrate the schema.
    async fn migrate(&self) -> CatalogResult<()>;

    /// Check backend connectivity and health.
    async fn health_check(&self) -> CatalogResult<()>;
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS albums (
    uid TEXT NOT NULL,
    provider_id TEXT NOT NULL,
    database_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    album_uid TEXT NOT NULL,
    synced INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (provider_id, database_id, album_uid)
);

CREATE INDEX IF NOT EXISTS idx_albums_synced ON albums (synced);

CREATE TABLE IF NOT EXISTS album_videos (
    provider_id TEXT NOT NULL,
    database_id TEXT NOT NULL,
    album_uid TEXT NOT NULL,
    video_uid TEXT NOT NULL,
    PRIMARY KEY (provider_id, database_id, album_uid, video_uid)
);

CREATE TABLE IF NOT EXISTS videos (
    uid TEXT NOT NULL,
    provider_id TEXT NOT NULL,
    database_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    video_uid TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (provider_id, database_id, video_uid)
);

CREATE TABLE IF NOT EXISTS objects (
    uid TEXT NOT NULL,
    provider_id TEXT NOT NULL,
    database_id TEXT NOT NULL,
    video_uid TEXT NOT NULL,
    storage_key TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (provider_id, database_id, video_uid)
);
"#;

/// SQLite-backed catalogue store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CatalogError::Config(format!("creating database directory: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under the
            // tick-loop + HTTP admission mix.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!(path = %path.display(), "sqlite catalog ready");
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn migrate(&self) -> CatalogResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> CatalogResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::{AlbumRow, AlbumVideoRow, ObjectRow, VideoRow};
    use gantry_core::{Album, AlbumVideo, StoredObject, Video};

    #[async_trait]
    impl AlbumRepo for SqliteStore {
        async fn get_album(
            &self,
            provider_id: &str,
            database_id: &str,
            album_uid: &str,
        ) -> CatalogResult<Option<Album>> {
            let row = sqlx::query_as::<_, AlbumRow>(
                "SELECT * FROM albums WHERE provider_id = ? AND database_id = ? AND album_uid = ?",
            )
            .bind(provider_id)
            .bind(database_id)
            .bind(album_uid)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(Album::from))
        }

        async fn create_album(&self, album: &Album) -> CatalogResult<()> {
            sqlx::query(
                r#"
                INSERT INTO albums (uid, provider_id, database_id, user_id, album_uid, synced, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&album.uid)
            .bind(&album.provider_id)
            .bind(&album.database_id)
            .bind(&album.user_id)
            .bind(&album.album_uid)
            .bind(album.synced)
            .bind(album.created_at)
            .bind(album.updated_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn update_album(&self, album: &Album) -> CatalogResult<()> {
            let result = sqlx::query(
                r#"
                UPDATE albums
                SET user_id = ?, synced = ?, updated_at = ?
                WHERE provider_id = ? AND database_id = ? AND album_uid = ?
                "#,
            )
            .bind(&album.user_id)
            .bind(album.synced)
            .bind(album.updated_at)
            .bind(&album.provider_id)
            .bind(&album.database_id)
            .bind(&album.album_uid)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(CatalogError::NotFound(format!(
                    "album {} not found",
                    album.album_uid
                )));
            }
            Ok(())
        }

        async fn find_albums_needing_repair(&self) -> CatalogResult<Vec<Album>> {
            let rows = sqlx::query_as::<_, AlbumRow>("SELECT * FROM albums WHERE synced = FALSE")
                .fetch_all(&self.pool)
                .await?;
            Ok(rows.into_iter().map(Album::from).collect())
        }
    }

    #[async_trait]
    impl AlbumVideoRepo for SqliteStore {
        async fn get_manifest(
            &self,
            provider_id: &str,
            database_id: &str,
            album_uid: &str,
        ) -> CatalogResult<Vec<AlbumVideo>> {
            let rows = sqlx::query_as::<_, AlbumVideoRow>(
                "SELECT * FROM album_videos WHERE provider_id = ? AND database_id = ? AND album_uid = ?",
            )
            .bind(provider_id)
            .bind(database_id)
            .bind(album_uid)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(AlbumVideo::from).collect())
        }

        async fn replace_manifest(
            &self,
            provider_id: &str,
            database_id: &str,
            album_uid: &str,
            videos: &[AlbumVideo],
        ) -> CatalogResult<()> {
            // One transaction: the old manifest disappears and the new one
            // appears atomically.
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                "DELETE FROM album_videos WHERE provider_id = ? AND database_id = ? AND album_uid = ?",
            )
            .bind(provider_id)
            .bind(database_id)
            .bind(album_uid)
            .execute(&mut *tx)
            .await?;

            for video in videos {
                sqlx::query(
                    r#"
                    INSERT INTO album_videos (provider_id, database_id, album_uid, video_uid)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(provider_id, database_id, album_uid, video_uid) DO NOTHING
                    "#,
                )
                .bind(&video.provider_id)
                .bind(&video.database_id)
                .bind(&video.album_uid)
                .bind(&video.video_uid)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok(())
        }

        async fn manifest_contains(
            &self,
            provider_id: &str,
            database_id: &str,
            album_uid: &str,
            video_uid: &str,
        ) -> CatalogResult<bool> {
            let row: Option<(i32,)> = sqlx::query_as(
                r#"
                SELECT 1 FROM album_videos
                WHERE provider_id = ? AND database_id = ? AND album_uid = ? AND video_uid = ?
                LIMIT 1
                "#,
            )
            .bind(provider_id)
            .bind(database_id)
            .bind(album_uid)
            .bind(video_uid)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.is_some())
        }
    }

    #[async_trait]
    impl VideoRepo for SqliteStore {
        async fn upsert_video(&self, video: &Video) -> CatalogResult<()> {
            sqlx::query(
                r#"
                INSERT INTO videos (uid, provider_id, database_id, user_id, video_uid, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(provider_id, database_id, video_uid)
                DO UPDATE SET user_id = excluded.user_id, updated_at = excluded.updated_at
                "#,
            )
            .bind(&video.uid)
            .bind(&video.provider_id)
            .bind(&video.database_id)
            .bind(&video.user_id)
            .bind(&video.video_uid)
            .bind(video.created_at)
            .bind(video.updated_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_video(
            &self,
            provider_id: &str,
            database_id: &str,
            video_uid: &str,
        ) -> CatalogResult<Option<Video>> {
            let row = sqlx::query_as::<_, VideoRow>(
                "SELECT * FROM videos WHERE provider_id = ? AND database_id = ? AND video_uid = ?",
            )
            .bind(provider_id)
            .bind(database_id)
            .bind(video_uid)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(Video::from))
        }
    }

    #[async_trait]
    impl ObjectRepo for SqliteStore {
        async fn upsert_object(&self, object: &StoredObject) -> CatalogResult<()> {
            sqlx::query(
                r#"
                INSERT INTO objects (uid, provider_id, database_id, video_uid, storage_key, size_bytes, checksum, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(provider_id, database_id, video_uid)
                DO UPDATE SET storage_key = excluded.storage_key,
                              size_bytes = excluded.size_bytes,
                              checksum = excluded.checksum,
                              created_at = excluded.created_at
                "#,
            )
            .bind(&object.uid)
            .bind(&object.provider_id)
            .bind(&object.database_id)
            .bind(&object.video_uid)
            .bind(&object.storage_key)
            .bind(object.size_bytes)
            .bind(&object.checksum)
            .bind(object.created_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_object(
            &self,
            provider_id: &str,
            database_id: &str,
            video_uid: &str,
        ) -> CatalogResult<Option<StoredObject>> {
            let row = sqlx::query_as::<_, ObjectRow>(
                "SELECT * FROM objects WHERE provider_id = ? AND database_id = ? AND video_uid = ?",
            )
            .bind(provider_id)
            .bind(database_id)
            .bind(video_uid)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(StoredObject::from))
        }

        async fn count_objects_for_album(
            &self,
            provider_id: &str,
            database_id: &str,
            album_uid: &str,
        ) -> CatalogResult<u64> {
            let count: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*)
                FROM objects o
                JOIN album_videos av
                  ON av.provider_id = o.provider_id
                 AND av.database_id = o.database_id
                 AND av.video_uid = o.video_uid
                WHERE av.provider_id = ? AND av.database_id = ? AND av.album_uid = ?
                "#,
            )
            .bind(provider_id)
            .bind(database_id)
            .bind(album_uid)
            .fetch_one(&self.pool)
            .await?;
            Ok(count as u64)
        }
    }
}
