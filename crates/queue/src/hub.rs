// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant-keyed subscriber registry and broadcast path. See spec §4.6.
//!
//! Modeled on `transport::ws_mux`'s per-client `mpsc::UnboundedSender`
//! registry: a nested map guarded by a single lock, released before any
//! network write happens on a subscriber's own connection task.
//!
//! The Hub fetches snapshots straight from the [`Repository`] rather than
//! through a handle back to the [`crate::engine::QueueEngine`]. `GetEntries`
//! is a pure delegation to the Repository with a tenant filter (spec §4.5),
//! so this is behavior-equivalent while avoiding a retain cycle between the
//! Engine (which holds the Hub's broadcast method as its `notify` callback)
//! and the Hub itself — exactly the cycle spec §9's "Cycles avoided" note
//! warns against.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::domain::{Entry, Status, TenantContext};
use crate::repository::{ListFilter, Repository};

const SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Statuses included in a broadcast snapshot, per spec §4.6.
const SNAPSHOT_STATUSES: [Status; 3] = [Status::Waiting, Status::Called, Status::InService];

/// `"default"` when no tenant id is present, otherwise the tenant id itself.
pub fn tenant_key(tenant_id: &str) -> String {
    if tenant_id.is_empty() {
        "default".to_owned()
    } else {
        tenant_id.to_owned()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueUpdate {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub entries: Vec<Entry>,
}

pub type SubscriberId = u64;

struct RoomSubscribers {
    /// `tenantKey -> subscriberId -> sender`.
    by_tenant: HashMap<String, HashMap<SubscriberId, mpsc::UnboundedSender<Arc<str>>>>,
}

pub struct Hub {
    repository: Arc<dyn Repository>,
    /// `roomId -> RoomSubscribers`.
    rooms: RwLock<HashMap<String, RoomSubscribers>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository, rooms: RwLock::new(HashMap::new()), next_id: AtomicU64::new(1) }
    }

    /// Register a subscriber and return its id plus the receiving half of
    /// its channel. The caller (the WS handler) is responsible for sending
    /// the initial snapshot after registering, then forwarding everything
    /// received on the channel to the socket until it closes.
    pub async fn subscribe(
        &self,
        room_id: &str,
        tenant_id: &str,
    ) -> (SubscriberId, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let key = tenant_key(tenant_id);

        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(room_id.to_owned()).or_insert_with(|| RoomSubscribers { by_tenant: HashMap::new() });
        room.by_tenant.entry(key).or_default().insert(id, tx);

        (id, rx)
    }

    pub async fn unsubscribe(&self, room_id: &str, tenant_id: &str, id: SubscriberId) {
        let key = tenant_key(tenant_id);
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(room_id) {
            if let Some(subs) = room.by_tenant.get_mut(&key) {
                subs.remove(&id);
            }
        }
    }

    /// Build the filtered snapshot for `(roomId, tenantId)`. Used both for
    /// the initial post-accept push and for each broadcast.
    pub async fn snapshot(&self, room_id: &str, tenant_id: &str) -> anyhow::Result<QueueUpdate> {
        let filter = ListFilter {
            tenant: tenant_context_for(tenant_id),
            statuses: Some(SNAPSHOT_STATUSES.to_vec()),
        };
        let entries = self.repository.list_by_room(room_id, &filter).await?;
        Ok(QueueUpdate { kind: "queue_update", room_id: room_id.to_owned(), entries })
    }

    /// Push a fresh snapshot to every subscriber of `(roomId, tenantKey)`.
    /// A closed channel is treated as a pending removal on the next sweep
    /// rather than a broadcast-time error — the broadcaster never blocks on
    /// a stalled subscriber's socket; that write happens in the
    /// subscriber's own task.
    pub async fn broadcast(&self, room_id: &str, tenant_id: &str) {
        let key = tenant_key(tenant_id);

        let senders: Vec<(SubscriberId, mpsc::UnboundedSender<Arc<str>>)> = {
            let rooms = self.rooms.read().await;
            match rooms.get(room_id).and_then(|r| r.by_tenant.get(&key)) {
                Some(subs) => subs.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
                None => return,
            }
        };
        if senders.is_empty() {
            return;
        }

        let snapshot = match self.snapshot(room_id, tenant_id).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(room_id, tenant_key = %key, err = %e, "failed to build broadcast snapshot");
                return;
            }
        };
        let payload: Arc<str> = match serde_json::to_string(&snapshot) {
            Ok(s) => s.into(),
            Err(e) => {
                tracing::warn!(err = %e, "failed to serialize queue update");
                return;
            }
        };

        let mut dead = Vec::new();
        for (id, tx) in senders {
            if tx.send(Arc::clone(&payload)).is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut rooms = self.rooms.write().await;
            if let Some(room) = rooms.get_mut(room_id) {
                if let Some(subs) = room.by_tenant.get_mut(&key) {
                    for id in dead {
                        subs.remove(&id);
                    }
                }
            }
        }
    }
}

/// The Engine's `notify` callback, wired so that notifications broadcast in
/// the order they were raised. A single background task drains the queue
/// and awaits each `Hub::broadcast` before taking the next one, so two rapid
/// mutations in the same room never race to reorder their broadcasts (spec
/// §5). Mirrors `webhook::spawn_sender`'s single-drain-task shape.
pub fn spawn_notifier(hub: Arc<Hub>, shutdown: CancellationToken) -> Arc<dyn Fn(String, String) + Send + Sync> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, String)>();

    tokio::spawn(async move {
        loop {
            let (room_id, tenant_id) = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = rx.recv() => match next {
                    Some(n) => n,
                    None => break,
                },
            };
            hub.broadcast(&room_id, &tenant_id).await;
        }
    });

    Arc::new(move |room_id, tenant_id| {
        let _ = tx.send((room_id, tenant_id));
    })
}

fn tenant_context_for(tenant_id: &str) -> TenantContext {
    if tenant_id.is_empty() {
        TenantContext::global()
    } else {
        TenantContext { tenant_id: Some(tenant_id.to_owned()), section_id: None }
    }
}

/// The per-message send timeout referenced by spec §4.6/§5. The actual
/// timeout is applied by each subscriber's own socket-write task (`ws.rs`),
/// since the broadcaster itself never performs the network write.
pub fn send_timeout() -> Duration {
    SEND_TIMEOUT
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
