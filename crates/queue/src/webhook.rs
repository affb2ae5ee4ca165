// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort webhook delivery. The Engine enqueues events after releasing
//! the room lock; a single background task drains the queue and POSTs each
//! one with linear backoff retries. See spec §4.5/§6/§9.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::Status;

/// The three event kinds the Engine emits, in the body shape spec §6
/// describes: `event`, `ticketId`, `state`, `timestamp`, `roomId`, optional
/// `servicePointId` and `userId`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub event: &'static str,
    pub ticket_id: String,
    pub state: Status,
    pub timestamp: DateTime<Utc>,
    pub room_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_point_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

pub type WebhookSender = mpsc::UnboundedSender<WebhookEvent>;

/// Spawn the background sender. Returns the channel the Engine pushes onto.
/// If `webhook_url` is `None`, the channel is still created and drained, but
/// every event is dropped without an HTTP call — emission is then a no-op.
pub fn spawn_sender(
    webhook_url: Option<String>,
    method: String,
    timeout: Duration,
    retries: u32,
    shutdown: CancellationToken,
) -> WebhookSender {
    let (tx, mut rx) = mpsc::unbounded_channel::<WebhookEvent>();

    tokio::spawn(async move {
        let Some(url) = webhook_url else {
            // Still drain so senders never block on a full channel (it's
            // unbounded, but draining keeps memory bounded too).
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = rx.recv() => if event.is_none() { break },
                }
            }
            return;
        };

        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(err = %e, "failed to build webhook http client, webhook emission disabled");
                return;
            }
        };

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => match event {
                    Some(e) => e,
                    None => break,
                },
            };

            if let Err(e) = deliver_with_retries(&client, &url, &method, &event, retries).await {
                tracing::warn!(err = %e, "webhook delivery exhausted retries");
            }
        }
    });

    tx
}

async fn deliver_with_retries(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    event: &WebhookEvent,
    retries: u32,
) -> anyhow::Result<()> {
    let mut backoff = Duration::from_millis(200);

    for attempt in 0..=retries {
        match deliver_once(client, url, method, event).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                if attempt == retries {
                    return Err(e);
                }
                tracing::debug!(attempt, err = %e, "webhook attempt failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff += Duration::from_millis(200);
            }
        }
    }

    anyhow::bail!("webhook delivery exhausted all retries")
}

async fn deliver_once(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    event: &WebhookEvent,
) -> anyhow::Result<()> {
    let request = match method.to_ascii_uppercase().as_str() {
        "PUT" => client.put(url),
        _ => client.post(url),
    };

    let resp = request.json(event).send().await?;
    if !resp.status().is_success() {
        let status = resp.status();
        anyhow::bail!("webhook endpoint returned {status}");
    }
    Ok(())
}
