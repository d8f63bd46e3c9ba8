//! Queue-integrated pipeline tests with a scripted in-process agent.
//!
//! These cover the cloud side of the distributed flow: consumer wiring,
//! the unsynced-flag protocol when the vault grows mid-transfer, and
//! repair convergence through the reconciliation loop.

mod common;

use axum::http::StatusCode;
use common::{TestServer, json_request, upload_video};
use gantry_core::messages::{
    AlbumManifestUploadPayload, METADATA_PROVIDER_ID, TOPIC_ALBUM_MANIFEST_UPLOAD,
    TOPIC_USER_ALBUMS, TOPIC_VIDEO_UPLOAD, UserAlbumsRequest,
};
use gantry_queue::{Message, Queue, TickableQueue, handler_fn};
use serde_json::json;
use std::sync::{Arc, Mutex};
use time::Duration;

/// A scripted vault: the album's current video list, plus an optional
/// one-shot growth step that fires after the next manifest snapshot, which
/// is exactly the window the admission gate has to defend.
#[derive(Default)]
struct ScriptedVault {
    videos: Vec<String>,
    grow_after_snapshot: Option<String>,
}

/// Wire fake agent-side consumers against the cloud router: the manifest
/// consumer snapshots the scripted vault and POSTs it, the transfer
/// consumer pushes every current vault video as a payload.
async fn wire_scripted_agent(server: &TestServer, vault: Arc<Mutex<ScriptedVault>>) {
    let router = server.router.clone();
    let vault_for_manifest = vault.clone();
    server
        .queue
        .subscribe(
            "agent:p1:albummanifestupload",
            TOPIC_ALBUM_MANIFEST_UPLOAD,
            "p1",
            handler_fn(move |msg: Message| {
                let router = router.clone();
                let vault = vault_for_manifest.clone();
                async move {
                    let payload: AlbumManifestUploadPayload =
                        serde_json::from_slice(&msg.payload)?;
                    let snapshot: Vec<String> = {
                        let vault = vault.lock().unwrap();
                        vault.videos.clone()
                    };
                    let (status, _) = json_request(
                        &router,
                        "/v1/albummanifestupload",
                        json!({
                            "providerID": "p1",
                            "databaseID": payload.database_id,
                            "userID": "user1",
                            "albumUID": payload.album_uid,
                            "videoUIDs": snapshot,
                        }),
                    )
                    .await;
                    anyhow::ensure!(status == StatusCode::OK, "manifest upload got {status}");

                    // The vault may change right after the snapshot is taken.
                    let mut vault = vault.lock().unwrap();
                    if let Some(new_video) = vault.grow_after_snapshot.take() {
                        vault.videos.push(new_video);
                    }
                    Ok(())
                }
            }),
        )
        .await
        .unwrap();

    let router = server.router.clone();
    let vault_for_transfer = vault.clone();
    server
        .queue
        .subscribe(
            "agent:p1:videoupload",
            TOPIC_VIDEO_UPLOAD,
            "p1",
            handler_fn(move |msg: Message| {
                let router = router.clone();
                let vault = vault_for_transfer.clone();
                async move {
                    let payload: gantry_core::messages::VideoUploadPayload =
                        serde_json::from_slice(&msg.payload)?;
                    let videos: Vec<String> = vault.lock().unwrap().videos.clone();
                    for video_uid in videos {
                        // A not-in-manifest rejection has already demoted the
                        // album; the transfer itself carries on.
                        upload_video(
                            &router,
                            &payload.album_uid,
                            "p1",
                            &payload.database_id,
                            "user1",
                            &video_uid,
                            format!("payload-{video_uid}").as_bytes(),
                        )
                        .await;
                    }
                    Ok(())
                }
            }),
        )
        .await
        .unwrap();
}

async fn publish_user_sync(server: &TestServer) {
    let payload = serde_json::to_vec(&UserAlbumsRequest {
        provider_id: "p1".into(),
        database_id: "db1".into(),
        user_id: "user1".into(),
        album_uids: vec!["album1".into()],
    })
    .unwrap();
    server
        .queue
        .publish(Message::new(TOPIC_USER_ALBUMS, payload).with_metadata(METADATA_PROVIDER_ID, "p1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn stable_vault_converges_in_one_pass() {
    let server = TestServer::new();
    server.state.subscribe_consumers().await.unwrap();

    let vault = Arc::new(Mutex::new(ScriptedVault {
        videos: vec!["v1".into()],
        grow_after_snapshot: None,
    }));
    wire_scripted_agent(&server, vault).await;

    publish_user_sync(&server).await;
    server.queue.process().await;

    let album = server
        .catalog()
        .get_album("p1", "db1", "album1")
        .await
        .unwrap()
        .expect("album should exist");
    assert!(album.synced);
    assert!(server.catalog().get_object("p1", "db1", "v1").await.unwrap().is_some());
}

#[tokio::test]
async fn vault_growth_mid_transfer_demotes_then_repair_converges() {
    let server = TestServer::new();
    server.state.subscribe_consumers().await.unwrap();

    let vault = Arc::new(Mutex::new(ScriptedVault {
        videos: vec!["v1".into()],
        grow_after_snapshot: Some("v2".into()),
    }));
    wire_scripted_agent(&server, vault).await;

    publish_user_sync(&server).await;
    server.queue.process().await;

    // The manifest said [v1]; the transfer pushed [v1, v2]. v2 was refused
    // and the album demoted.
    let album = server
        .catalog()
        .get_album("p1", "db1", "album1")
        .await
        .unwrap()
        .unwrap();
    assert!(!album.synced);
    assert!(server.catalog().get_object("p1", "db1", "v1").await.unwrap().is_some());
    assert!(server.catalog().get_object("p1", "db1", "v2").await.unwrap().is_none());

    // One repair cycle: scan, drain, let the backoff elapse, drain again.
    let worker = server.state.consistency_worker();
    worker.scan().await.unwrap();
    server.queue.process().await;
    server.clock.advance(Duration::seconds(1));
    server.queue.process().await;

    let album = server
        .catalog()
        .get_album("p1", "db1", "album1")
        .await
        .unwrap()
        .unwrap();
    assert!(album.synced, "repair should converge the album");
    assert!(server.catalog().get_object("p1", "db1", "v2").await.unwrap().is_some());
    assert_eq!(
        server
            .catalog()
            .count_objects_for_album("p1", "db1", "album1")
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn repair_scan_is_a_noop_for_synced_albums() {
    let server = TestServer::new();
    server.state.subscribe_consumers().await.unwrap();

    let vault = Arc::new(Mutex::new(ScriptedVault {
        videos: vec!["v1".into()],
        grow_after_snapshot: None,
    }));
    wire_scripted_agent(&server, vault).await;

    publish_user_sync(&server).await;
    server.queue.process().await;

    let worker = server.state.consistency_worker();
    worker.scan().await.unwrap();
    assert_eq!(server.queue.pending_count(), 0, "nothing to repair");
}
