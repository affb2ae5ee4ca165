// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/ws/queue/{roomId}` push channel. See spec §4.6/§6.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::hub::send_timeout;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct QueueWsQuery {
    #[serde(default, rename = "tenantId")]
    pub tenant_id: Option<String>,
}

/// `GET /ws/queue/{roomId}`
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<QueueWsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let tenant_id = headers
        .get("X-Tenant-ID")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or(query.tenant_id)
        .unwrap_or_default();

    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, tenant_id))
}

/// Per-connection handler: pushes the initial snapshot, then forwards every
/// broadcast the Hub sends until the socket closes. Inbound frames are read
/// and discarded (spec §6: "the channel is push-only from the server").
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: String, tenant_id: String) {
    let (subscriber_id, mut updates) = state.hub.subscribe(&room_id, &tenant_id).await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    let initial = match state.hub.snapshot(&room_id, &tenant_id).await {
        Ok(snapshot) => serde_json::to_string(&snapshot).ok(),
        Err(e) => {
            tracing::warn!(room_id = %room_id, err = %e, "failed to build initial queue snapshot");
            None
        }
    };
    if let Some(payload) = initial {
        if send_with_timeout(&mut ws_tx, payload).await.is_err() {
            state.hub.unsubscribe(&room_id, &tenant_id, subscriber_id).await;
            return;
        }
    }

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            update = updates.recv() => {
                match update {
                    Some(payload) => {
                        if send_with_timeout(&mut ws_tx, payload.to_string()).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Inbound frames are ignored per the push-only contract.
                    _ => {}
                }
            }
        }
    }

    state.hub.unsubscribe(&room_id, &tenant_id, subscriber_id).await;
}

async fn send_with_timeout(
    ws_tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    payload: String,
) -> Result<(), ()> {
    match tokio::time::timeout(send_timeout(), ws_tx.send(Message::Text(payload.into()))).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) | Err(_) => Err(()),
    }
}
