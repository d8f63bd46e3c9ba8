//! Catalogue entities.
//!
//! Every persisted entity is keyed by the tenant-scoped tuple
//! `(provider_id, database_id, <local id>)`. All identifiers are opaque
//! strings supplied by the on-prem side.

use time::OffsetDateTime;

/// An album known to the cloud catalogue.
///
/// Created by the first manifest upload and never deleted. `synced` is the
/// reconciliation signal: false iff some video admission was rejected as
/// not-in-manifest since the last successful manifest write.
#[derive(Clone, Debug, PartialEq)]
pub struct Album {
    /// Internal composite uid (`{provider}-{database}-{album_uid}`).
    pub uid: String,
    pub provider_id: String,
    pub database_id: String,
    pub user_id: String,
    pub album_uid: String,
    pub synced: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Album {
    /// Build the internal composite uid for an album.
    pub fn composite_uid(provider_id: &str, database_id: &str, album_uid: &str) -> String {
        format!("{provider_id}-{database_id}-{album_uid}")
    }
}

/// One manifest entry: a video's membership in an album.
///
/// The set of entries for an album is replaced as a whole, never merged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlbumVideo {
    pub provider_id: String,
    pub database_id: String,
    pub album_uid: String,
    pub video_uid: String,
}

/// Per-video metadata, upserted on each successful admission.
#[derive(Clone, Debug, PartialEq)]
pub struct Video {
    /// Internal composite uid (`{provider}-{database}-{video_uid}`).
    pub uid: String,
    pub provider_id: String,
    pub database_id: String,
    pub user_id: String,
    pub video_uid: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Video {
    pub fn composite_uid(provider_id: &str, database_id: &str, video_uid: &str) -> String {
        format!("{provider_id}-{database_id}-{video_uid}")
    }
}

/// The stored binary form of a video.
///
/// May exist only if the video was in the album's manifest at the moment of
/// admission (membership gate).
#[derive(Clone, Debug, PartialEq)]
pub struct StoredObject {
    /// Internal composite uid (`{provider}-{database}-{video_uid}-obj`).
    pub uid: String,
    pub provider_id: String,
    pub database_id: String,
    pub video_uid: String,
    /// `objects/{provider}/{database}/{video_uid}`.
    pub storage_key: String,
    pub size_bytes: i64,
    /// Lowercase sha256 hex of the payload.
    pub checksum: String,
    pub created_at: OffsetDateTime,
}

impl StoredObject {
    pub fn composite_uid(provider_id: &str, database_id: &str, video_uid: &str) -> String {
        format!("{provider_id}-{database_id}-{video_uid}-obj")
    }

    /// Build the storage key an admitted payload is filed under.
    pub fn storage_key(provider_id: &str, database_id: &str, video_uid: &str) -> String {
        format!("objects/{provider_id}/{database_id}/{video_uid}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_uids_are_tenant_scoped() {
        assert_eq!(Album::composite_uid("p1", "db1", "a1"), "p1-db1-a1");
        assert_eq!(Video::composite_uid("p1", "db1", "v1"), "p1-db1-v1");
        assert_eq!(
            StoredObject::composite_uid("p1", "db1", "v1"),
            "p1-db1-v1-obj"
        );
        assert_eq!(
            StoredObject::storage_key("p1", "db1", "v1"),
            "objects/p1/db1/v1"
        );
    }
}
