// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP integration tests against a real router + in-memory repository.

use std::path::PathBuf;
use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use queue::config::{QueueConfig, RoomsConfig};
use queue::config_cache::ConfigCache;
use queue::engine::QueueEngine;
use queue::hub::{spawn_notifier, Hub};
use queue::priority_config::PriorityConfigStore;
use queue::registry::ServicePointRegistry;
use queue::repository::memory::MemoryRepository;
use queue::repository::Repository;
use queue::state::AppState;
use queue::transport::build_router;
use queue::webhook::spawn_sender;

fn test_config() -> QueueConfig {
    QueueConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        rooms_config: None,
        allow_wildcard_rooms: true,
        service_point_fresh_secs: 300,
        service_point_evict_secs: 600,
        service_point_sweep_secs: 300,
        config_cache_refresh_secs: 30,
        webhook_url: None,
        webhook_method: "POST".to_owned(),
        webhook_timeout_ms: 1000,
        webhook_retries: 0,
        db_path: None::<PathBuf>,
    }
}

fn test_server() -> TestServer {
    let config = test_config();
    let shutdown = CancellationToken::new();
    let repository: Arc<dyn Repository> = Arc::new(MemoryRepository::new());
    let priority_configs = Arc::new(PriorityConfigStore::new());
    let rooms_config = RoomsConfig::default();
    let registry = Arc::new(ServicePointRegistry::new(
        &rooms_config,
        config.service_point_fresh_window(),
        config.service_point_evict_age(),
    ));
    let config_cache = ConfigCache::new(None, rooms_config.clone());
    let hub = Arc::new(Hub::new(Arc::clone(&repository)));
    let notify = spawn_notifier(Arc::clone(&hub), shutdown.clone());

    let webhook_tx = spawn_sender(None, "POST".to_owned(), config.webhook_timeout(), 0, shutdown.clone());

    let engine = Arc::new(QueueEngine::new(
        Arc::clone(&repository),
        Arc::clone(&priority_configs),
        Arc::clone(&registry),
        rooms_config,
        true,
        notify,
        webhook_tx,
        shutdown.clone(),
    ));

    let state = Arc::new(AppState {
        config,
        repository,
        engine,
        hub,
        registry,
        priority_configs,
        config_cache,
        shutdown,
    });

    TestServer::new(build_router(state)).expect("build test server")
}

#[tokio::test]
async fn health_reports_ok() {
    let server = test_server();
    let resp = server.get("/healthz").await;
    resp.assert_status_ok();
    resp.assert_json(&json!({ "status": "ok" }));
}

#[tokio::test]
async fn swipe_admits_an_entry_and_returns_its_qr_url() {
    let server = test_server();
    let resp = server
        .post("/waiting-rooms/room-a/swipe")
        .json(&json!({ "identifier": "badge-1" }))
        .await;
    resp.assert_status(axum::http::StatusCode::CREATED);

    let body: serde_json::Value = resp.json();
    assert!(body["entryId"].is_string());
    assert!(body["ticketNumber"].is_string());
    assert!(body["qrUrl"].as_str().unwrap_or_default().starts_with("/queue-entries/token/"));
}

#[tokio::test]
async fn swipe_rejects_blank_identifier() {
    let server = test_server();
    let resp = server
        .post("/waiting-rooms/room-a/swipe")
        .json(&json!({ "identifier": "   " }))
        .await;
    resp.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn call_next_on_empty_room_returns_404() {
    let server = test_server();
    let resp = server.post("/waiting-rooms/room-a/next").await;
    resp.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn statim_jumps_ahead_in_queue_listing() {
    let server = test_server();
    server.post("/waiting-rooms/room-a/swipe").json(&json!({ "identifier": "first" })).await;
    server
        .post("/waiting-rooms/room-a/swipe")
        .json(&json!({ "identifier": "second", "symbols": ["STATIM"] }))
        .await;

    let resp = server.get("/waiting-rooms/room-a/queue").await;
    resp.assert_status_ok();
    let entries: serde_json::Value = resp.json();
    let list = entries.as_array().expect("array response");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["symbols"][0], "STATIM");
}

#[tokio::test]
async fn token_lookup_reports_position_and_cancel_eligibility() {
    let server = test_server();
    let swipe = server
        .post("/waiting-rooms/room-a/swipe")
        .json(&json!({ "identifier": "badge-1" }))
        .await;
    let swipe_body: serde_json::Value = swipe.json();
    let qr_url = swipe_body["qrUrl"].as_str().expect("qrUrl").to_owned();

    let resp = server.get(&qr_url).await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "WAITING");
    assert_eq!(body["position"], 1);
    assert_eq!(body["canCancel"], true);
}

#[tokio::test]
async fn cancel_then_lookup_reflects_cancelled_state() {
    let server = test_server();
    let swipe = server
        .post("/waiting-rooms/room-a/swipe")
        .json(&json!({ "identifier": "badge-1" }))
        .await;
    let swipe_body: serde_json::Value = swipe.json();
    let entry_id = swipe_body["entryId"].as_str().expect("entryId").to_owned();
    let qr_url = swipe_body["qrUrl"].as_str().expect("qrUrl").to_owned();

    let cancel = server.post(&format!("/queue-entries/{entry_id}/cancel")).await;
    cancel.assert_status_ok();
    let cancelled: serde_json::Value = cancel.json();
    assert_eq!(cancelled["status"], "CANCELLED");

    let lookup = server.get(&qr_url).await;
    lookup.assert_status_ok();
    let lookup_body: serde_json::Value = lookup.json();
    assert_eq!(lookup_body["canCancel"], false);
}

#[tokio::test]
async fn busy_service_point_rejects_second_call_next() {
    let server = test_server();
    server.post("/waiting-rooms/room-a/swipe").json(&json!({ "identifier": "a" })).await;
    server.post("/waiting-rooms/room-a/swipe").json(&json!({ "identifier": "b" })).await;

    let first = server
        .post("/waiting-rooms/room-a/next")
        .json(&json!({ "servicePointId": "sp-1" }))
        .await;
    first.assert_status_ok();

    let second = server
        .post("/waiting-rooms/room-a/next")
        .json(&json!({ "servicePointId": "sp-1" }))
        .await;
    second.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn full_lifecycle_in_room_then_finish_frees_the_window() {
    let server = test_server();
    let swipe = server.post("/waiting-rooms/room-a/swipe").json(&json!({ "identifier": "a" })).await;
    let entry: serde_json::Value = swipe.json();
    let entry_id = entry["entryId"].as_str().expect("entryId").to_owned();

    let called = server
        .post("/waiting-rooms/room-a/next")
        .json(&json!({ "servicePointId": "sp-1" }))
        .await;
    called.assert_status_ok();

    let in_room = server
        .post("/waiting-rooms/room-a/service-points/sp-1/in-room")
        .json(&json!({ "entryId": entry_id }))
        .await;
    in_room.assert_status_ok();
    let in_room_body: serde_json::Value = in_room.json();
    assert_eq!(in_room_body["status"], "IN_ROOM");

    let finish = server.post("/waiting-rooms/room-a/service-points/sp-1/finish").await;
    finish.assert_status_ok();
    let finish_body: serde_json::Value = finish.json();
    assert_eq!(finish_body["status"], "COMPLETED");

    // The window is free again.
    server.post("/waiting-rooms/room-a/swipe").json(&json!({ "identifier": "c" })).await;
    let next = server
        .post("/waiting-rooms/room-a/next")
        .json(&json!({ "servicePointId": "sp-1" }))
        .await;
    next.assert_status_ok();
}
