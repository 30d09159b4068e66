/// Integration tests for the HTTP remote sync client
///
/// Tests verify:
/// 1. Increment and rename requests hit the expected paths with the
///    expected bodies and bearer token
/// 2. Non-2xx responses map to SyncError::Http
/// 3. User ids are sent as one percent-encoded path segment
/// 4. A failing backend never rolls back local rewards
///
/// Uses a local mockito server; no network access required.
///
/// Run with: cargo test --test remote_sync_integration

use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use serde_json::json;

use patimon_service::model::UserProfile;
use patimon_service::rewards::{RewardLedger, SessionStore};
use patimon_service::store::MemoryStore;
use patimon_service::sync::{HttpRemoteSync, RemoteSync, SyncError};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn client(url: &str, token: Option<&str>) -> HttpRemoteSync {
    HttpRemoteSync::new(url, token.map(str::to_string), Duration::from_secs(5)).unwrap()
}

fn volunteer() -> UserProfile {
    UserProfile {
        id: "u_ayse".to_string(),
        display_name: "Ayşe".to_string(),
        points: 120,
        total_feedings: 3,
    }
}

// ---------------------------------------------------------------------------
// Client requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_increment_points_posts_field_and_amount() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/users/u_ayse/increments")
        .match_header("authorization", "Bearer s3cret")
        .match_body(Matcher::Json(json!({"field": "points", "by": 50})))
        .with_status(200)
        .create_async()
        .await;

    let result = client(&server.url(), Some("s3cret")).increment_points("u_ayse", 50).await;

    assert_eq!(result, Ok(()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_increment_feedings_uses_backend_field_name() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/users/u_ayse/increments")
        .match_body(Matcher::Json(json!({"field": "totalFeedings", "by": 1})))
        .with_status(204)
        .create_async()
        .await;

    let result = client(&server.url(), None).increment_feedings("u_ayse", 1).await;

    assert_eq!(result, Ok(()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_set_display_name_patches_user_document() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", "/users/u_ayse")
        .match_body(Matcher::Json(json!({"displayName": "Ayşe K."})))
        .with_status(200)
        .create_async()
        .await;

    let result = client(&server.url(), None).set_display_name("u_ayse", "Ayşe K.").await;

    assert_eq!(result, Ok(()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_user_id_with_path_characters_stays_one_segment() {
    let mut server = mockito::Server::new_async().await;
    let encoded = server
        .mock("POST", "/users/a%2Fb/increments")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let escaped = server
        .mock("PATCH", "/admin")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;
    let renamed = server
        .mock("PATCH", "/users/..%2Fadmin")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let sync = client(&server.url(), None);
    assert_eq!(sync.increment_points("a/b", 50).await, Ok(()));
    assert_eq!(sync.set_display_name("../admin", "x").await, Ok(()));

    encoded.assert_async().await;
    renamed.assert_async().await;
    escaped.assert_async().await;
}

#[tokio::test]
async fn test_dot_user_id_is_rejected_before_sending() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", Matcher::Any)
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let result = client(&server.url(), None).set_display_name("..", "x").await;

    assert_eq!(result, Err(SyncError::InvalidUserId("..".to_string())));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_maps_to_http_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/users/u_ayse/increments")
        .with_status(500)
        .create_async()
        .await;

    let result = client(&server.url(), None).increment_points("u_ayse", 50).await;

    assert_eq!(result, Err(SyncError::Http(500)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Port 9 (discard) on localhost is not expected to be listening.
    let result = client("http://127.0.0.1:9", None).increment_points("u_ayse", 1).await;
    assert!(matches!(result, Err(SyncError::Transport(_)) | Err(SyncError::Timeout(_))));
}

// ---------------------------------------------------------------------------
// Ledger against a live client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_refill_syncs_points_then_feedings() {
    let mut server = mockito::Server::new_async().await;
    let points = server
        .mock("POST", "/users/u_ayse/increments")
        .match_body(Matcher::Json(json!({"field": "points", "by": 50})))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let feedings = server
        .mock("POST", "/users/u_ayse/increments")
        .match_body(Matcher::Json(json!({"field": "totalFeedings", "by": 1})))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let ledger = RewardLedger::new(SessionStore::new(Arc::new(MemoryStore::new())))
        .with_remote(Arc::new(client(&server.url(), None)));

    let updated = ledger.credit_refill(&volunteer(), "st_kordon", 50);
    ledger.flush_pending().await;

    assert_eq!(updated.points, 170);
    points.assert_async().await;
    feedings.assert_async().await;
}

#[tokio::test]
async fn test_failing_backend_keeps_local_rewards() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let sessions = SessionStore::new(Arc::new(MemoryStore::new()));
    let ledger = RewardLedger::new(sessions.clone())
        .with_remote(Arc::new(client(&server.url(), None)));

    let updated = ledger.credit_refill(&volunteer(), "st_kordon", 50);
    ledger.flush_pending().await;

    assert_eq!(updated.points, 170);
    assert_eq!(updated.total_feedings, 4);
    assert_eq!(sessions.load().unwrap(), Some(updated));
    assert_eq!(ledger.pending_syncs(), 0);
}

#[tokio::test]
async fn test_demo_account_never_reaches_backend() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let ledger = RewardLedger::new(SessionStore::new(Arc::new(MemoryStore::new())))
        .with_remote(Arc::new(client(&server.url(), None)));

    let demo = UserProfile::new_volunteer("demo_user_nisa", "Nisa");
    ledger.credit_refill(&demo, "st_kordon", 50);
    ledger.flush_pending().await;

    mock.assert_async().await;
}
