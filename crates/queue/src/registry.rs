// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-Point Registry — tracks which manager is currently available at
//! which window, with TTL-based eviction. See spec §4.4.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::RoomsConfig;
use crate::error::{QueueError, QueueResult};

/// `(managerId, managerName, roomId, servicePointId, isAvailable, lastSeen)`.
#[derive(Debug, Clone)]
pub struct ServicePointStatus {
    pub manager_id: String,
    pub manager_name: String,
    pub room_id: String,
    pub service_point_id: String,
    pub is_available: bool,
    pub last_seen: Instant,
}

struct Inner {
    /// Keyed by `managerId`.
    by_manager: HashMap<String, ServicePointStatus>,
    /// Statically configured service points per room, for the fallback rule.
    configured: HashMap<String, Vec<String>>,
}

/// In-memory, exclusive per process. A single reader/writer lock over the
/// whole table; operations never suspend.
pub struct ServicePointRegistry {
    inner: RwLock<Inner>,
    fresh_window: Duration,
    evict_age: Duration,
}

impl ServicePointRegistry {
    pub fn new(rooms: &RoomsConfig, fresh_window: Duration, evict_age: Duration) -> Self {
        let configured = rooms
            .rooms
            .iter()
            .map(|r| (r.waiting_room_id.clone(), r.service_points.clone()))
            .collect();
        Self {
            inner: RwLock::new(Inner { by_manager: HashMap::new(), configured }),
            fresh_window,
            evict_age,
        }
    }

    pub async fn login(&self, manager_id: &str, manager_name: &str, room_id: &str, service_point_id: &str) {
        let mut inner = self.inner.write().await;
        inner.by_manager.insert(
            manager_id.to_owned(),
            ServicePointStatus {
                manager_id: manager_id.to_owned(),
                manager_name: manager_name.to_owned(),
                room_id: room_id.to_owned(),
                service_point_id: service_point_id.to_owned(),
                is_available: true,
                last_seen: Instant::now(),
            },
        );
    }

    pub async fn logout(&self, manager_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(status) = inner.by_manager.get_mut(manager_id) {
            status.is_available = false;
        }
    }

    pub async fn heartbeat(&self, manager_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(status) = inner.by_manager.get_mut(manager_id) {
            status.last_seen = Instant::now();
        }
    }

    /// The first configured service point whose assigned manager is
    /// available and fresh; otherwise the first configured service point as
    /// fallback. Fails with `Unavailable` if the room has none configured.
    pub async fn available(&self, room_id: &str) -> QueueResult<String> {
        let inner = self.inner.read().await;
        let configured = inner
            .configured
            .get(room_id)
            .ok_or_else(|| QueueError::Unavailable(format!("no service points configured for room {room_id}")))?;
        if configured.is_empty() {
            return Err(QueueError::Unavailable(format!(
                "no service points configured for room {room_id}"
            )));
        }

        for sp in configured {
            let fresh = inner.by_manager.values().any(|status| {
                status.room_id == room_id
                    && status.service_point_id == *sp
                    && status.is_available
                    && status.last_seen.elapsed() < self.fresh_window
            });
            if fresh {
                return Ok(sp.clone());
            }
        }

        Ok(configured[0].clone())
    }

    /// Sweep statuses whose `last_seen` exceeds the eviction age.
    async fn evict_stale(&self) {
        let mut inner = self.inner.write().await;
        inner.by_manager.retain(|_, status| status.last_seen.elapsed() < self.evict_age);
    }
}

/// Spawn the background eviction sweep, ticking every `sweep_interval`.
pub fn spawn_eviction_sweep(
    registry: Arc<ServicePointRegistry>,
    sweep_interval: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(sweep_interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }
            registry.evict_stale().await;
        }
    });
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
