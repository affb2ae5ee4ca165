// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the waiting-room queue server.

pub mod http;
pub mod tenant;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all queue-server routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(http::health))
        .route("/waiting-rooms/{roomId}/swipe", post(http::swipe))
        .route("/waiting-rooms/{roomId}/next", post(http::call_next))
        .route(
            "/waiting-rooms/{roomId}/service-points/{spId}/in-room",
            post(http::mark_in_room),
        )
        .route(
            "/waiting-rooms/{roomId}/service-points/{spId}/finish",
            post(http::finish),
        )
        .route("/waiting-rooms/{roomId}/queue", get(http::list_queue))
        .route("/queue-entries/token/{qrToken}", get(http::token_lookup))
        .route("/queue-entries/{entryId}/cancel", post(http::cancel_entry))
        .route("/ws/queue/{roomId}", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
