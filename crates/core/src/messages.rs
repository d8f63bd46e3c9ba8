//! Wire format: queue topics, queue payloads and HTTP request bodies.
//!
//! Field renames match the JSON the on-prem side has always produced
//! (`providerID`, `albumUID`, ...); do not change them without a protocol
//! version bump.

use serde::{Deserialize, Serialize};

/// Agent-side: list a user's albums and announce them to the cloud.
pub const TOPIC_USER_SYNC: &str = "usersync";
/// Cloud-side: fan a user's album list out into per-album manifest work.
pub const TOPIC_USER_ALBUMS: &str = "useralbums";
/// Agent-side: snapshot an album's manifest and upload it.
pub const TOPIC_ALBUM_MANIFEST_UPLOAD: &str = "albummanifestupload";
/// Agent-side: trigger the vault transfer for an album.
pub const TOPIC_VIDEO_UPLOAD: &str = "videoupload";
/// Cloud-side: re-check one unsynced album.
pub const TOPIC_CONSISTENCY_CHECK: &str = "syncconsistencycheck";

/// Metadata key carrying the tenant routing filter.
pub const METADATA_PROVIDER_ID: &str = "providerID";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncUserPayload {
    #[serde(rename = "databaseID")]
    pub database_id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
}

/// Body of `POST /v1/useralbums` and payload of the `useralbums` topic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAlbumsRequest {
    #[serde(rename = "providerID")]
    pub provider_id: String,
    #[serde(rename = "databaseID")]
    pub database_id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "albumUIDs")]
    pub album_uids: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlbumManifestUploadPayload {
    #[serde(rename = "databaseID")]
    pub database_id: String,
    #[serde(rename = "albumUID")]
    pub album_uid: String,
}

/// Body of `POST /v1/albummanifestupload`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlbumManifestUploadRequest {
    #[serde(rename = "providerID")]
    pub provider_id: String,
    #[serde(rename = "databaseID")]
    pub database_id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "albumUID")]
    pub album_uid: String,
    #[serde(rename = "videoUIDs")]
    pub video_uids: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoUploadPayload {
    #[serde(rename = "databaseID")]
    pub database_id: String,
    #[serde(rename = "albumUID")]
    pub album_uid: String,
}

/// A single video admission. The payload travels as the request body, not
/// as JSON; everything else rides in `X-*` headers.
#[derive(Clone, Debug)]
pub struct VideoUploadRequest {
    pub provider_id: String,
    pub database_id: String,
    pub user_id: String,
    pub album_uid: String,
    pub video_uid: String,
    pub data: Vec<u8>,
}

/// Payload of the `syncconsistencycheck` topic.
///
/// The provider travels inside the payload because the consumer is
/// cloud-side and subscribes with an empty filter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsistencyCheckPayload {
    #[serde(rename = "providerID")]
    pub provider_id: String,
    #[serde(rename = "databaseID")]
    pub database_id: String,
    #[serde(rename = "albumUID")]
    pub album_uid: String,
    pub attempt: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_keep_the_legacy_field_names() {
        let payload = ConsistencyCheckPayload {
            provider_id: "p1".into(),
            database_id: "db1".into(),
            album_uid: "album1".into(),
            attempt: 2,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"providerID\":\"p1\""));
        assert!(json.contains("\"albumUID\":\"album1\""));
        assert!(json.contains("\"attempt\":2"));
    }

    #[test]
    fn user_albums_request_roundtrip() {
        let json = r#"{"providerID":"p1","databaseID":"db1","userID":"u1","albumUIDs":["a1","a2"]}"#;
        let req: UserAlbumsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.album_uids, vec!["a1", "a2"]);
        assert_eq!(serde_json::to_string(&req).unwrap(), json);
    }
}
