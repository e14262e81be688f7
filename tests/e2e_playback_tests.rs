//! End-to-end tests for long-poll delivery and playback routes
//!
//! Tests event draining, the snapshot fallback, loading from the library
//! or a location, and the playback control permission.

mod common;

use common::{
    TestClient, TestServer, ALBUM_ID, MISSING_ID, PLAYLIST_ID, TRACK_1_ID, TRACK_1_TITLE,
    TRACK_2_ID,
};
use reqwest::StatusCode;
use serde_json::Value;

async fn poll(client: &TestClient) -> Vec<Value> {
    let response = client.longpolling().await;
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.expect("Long-poll body is not a JSON array")
}

fn find<'a>(events: &'a [Value], event_type: &str) -> Option<&'a Value> {
    events.iter().rev().find(|e| e["type"] == event_type)
}

fn queue_ids(events: &[Value]) -> Vec<i64> {
    find(events, "play-queue")
        .and_then(|e| e["medias"].as_array())
        .map(|medias| medias.iter().filter_map(|m| m["id"].as_i64()).collect())
        .unwrap_or_default()
}

// ============================================================================
// Long-poll Tests
// ============================================================================

#[tokio::test]
async fn test_longpolling_falls_back_to_player_snapshot() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;

    // Whatever the player published since startup goes first, a quiet bus
    // then answers with a full snapshot
    let mut snapshot = None;
    for _ in 0..5 {
        let events = poll(&client).await;
        if events.len() == 3 && find(&events, "play-queue").is_some() {
            snapshot = Some(events);
            break;
        }
    }
    let snapshot = snapshot.expect("No snapshot after a quiet long-poll");
    assert!(find(&snapshot, "player-status").is_some());
    assert!(find(&snapshot, "now-playing").is_some());
    assert_eq!(find(&snapshot, "player-status").unwrap()["playing"], false);
}

#[tokio::test]
async fn test_longpolling_delivers_events_queued_by_load() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;

    assert_eq!(client.play_media(TRACK_1_ID).await.status(), StatusCode::OK);

    let events = poll(&client).await;
    assert_eq!(queue_ids(&events), vec![TRACK_1_ID]);
    let now_playing = find(&events, "now-playing").expect("No now-playing event");
    assert_eq!(now_playing["title"], TRACK_1_TITLE);
    assert_eq!(find(&events, "player-status").unwrap()["playing"], true);
}

// ============================================================================
// Loading Tests
// ============================================================================

#[tokio::test]
async fn test_play_collections() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;

    let response = client
        .play(&[("type", "album"), ("id", &ALBUM_ID.to_string())])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(queue_ids(&poll(&client).await), vec![TRACK_1_ID, TRACK_2_ID]);

    let response = client
        .play_all(&[("type", "playlist"), ("id", &PLAYLIST_ID.to_string())])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(queue_ids(&poll(&client).await), vec![TRACK_2_ID, TRACK_1_ID]);
}

#[tokio::test]
async fn test_play_appends_to_queue() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;

    client.play_media(TRACK_1_ID).await;
    let response = client
        .play(&[("id", &TRACK_2_ID.to_string()), ("append", "true")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot = server.state.player.snapshot().await.unwrap();
    let ids: Vec<i64> = snapshot.play_queue.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![TRACK_1_ID, TRACK_2_ID]);
}

#[tokio::test]
async fn test_play_unknown_items_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;

    assert_eq!(
        client.play_media(MISSING_ID).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(client.play(&[]).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        client.play_all(&[("type", "album")]).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_play_location_outside_library() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;

    let response = client
        .play(&[("path", "http://radio.example.com/live/Morning%20Show")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot = server.state.player.snapshot().await.unwrap();
    let current = snapshot.current_media.expect("Nothing loaded");
    assert_eq!(current.id, -1);
    assert_eq!(current.title, "Morning Show");
}

#[tokio::test]
async fn test_play_all_browsed_directory() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;
    let album_dir = server.media_root.join("music").join(common::ALBUM_TITLE);
    let path = remote_access_gateway::library::file_uri(&album_dir);

    let response = client.play_all(&[("type", "browser"), ("path", &path)]).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Files known to the library keep their ids
    let snapshot = server.state.player.snapshot().await.unwrap();
    let mut ids: Vec<i64> = snapshot.play_queue.iter().map(|m| m.id).collect();
    ids.sort();
    assert_eq!(ids, vec![TRACK_1_ID, TRACK_2_ID]);
}

#[tokio::test]
async fn test_resume_playback_without_history_has_no_content() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;

    assert_eq!(
        client.resume_playback(true).await.status(),
        StatusCode::NO_CONTENT
    );
}

// ============================================================================
// Command Tests
// ============================================================================

#[tokio::test]
async fn test_playback_event_commands() {
    let server = TestServer::spawn().await;
    let client = TestClient::paired(&server).await;

    // Nothing to play yet
    assert_eq!(
        client.playback_event(&[("message", "play")]).await.status(),
        StatusCode::FORBIDDEN
    );
    // No message is a no-op
    assert_eq!(client.playback_event(&[]).await.status(), StatusCode::OK);
    assert_eq!(
        client
            .playback_event(&[("message", "self-destruct")])
            .await
            .status(),
        StatusCode::FORBIDDEN
    );

    client.play_media(TRACK_1_ID).await;
    assert_eq!(
        client.playback_event(&[("message", "pause")]).await.status(),
        StatusCode::OK
    );
    let snapshot = server.state.player.snapshot().await.unwrap();
    assert!(!snapshot.playing);

    assert_eq!(
        client
            .playback_event(&[("message", "set-progress"), ("id", "5000")])
            .await
            .status(),
        StatusCode::OK
    );
    let snapshot = server.state.player.snapshot().await.unwrap();
    assert_eq!(snapshot.now_playing.progress, 5000);
}

#[tokio::test]
async fn test_disabled_playback_control_is_forbidden_and_announced() {
    let server =
        TestServer::spawn_with(|config| config.features.playback_control = false).await;
    let client = TestClient::paired(&server).await;

    assert_eq!(
        client.play_media(TRACK_1_ID).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        client.playback_event(&[("message", "next")]).await.status(),
        StatusCode::FORBIDDEN
    );
    // Reading the volume is not control
    assert_eq!(
        client.playback_event(&[("message", "get-volume")]).await.status(),
        StatusCode::OK
    );

    let events = poll(&client).await;
    let forbidden = find(&events, "playback-control-forbidden").expect("Not announced");
    assert_eq!(forbidden["forbidden"], true);
}
