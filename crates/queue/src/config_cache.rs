// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config Cache — read-through cache of the system configuration document
//! (the rooms/service-points document loaded from `--rooms-config`),
//! refreshed every 30 seconds in the background with an immediate refresh
//! after any write. See spec §4.7.
//!
//! Tenant-scoped reads never go through this cache: `PriorityConfigStore`
//! is queried directly per spec §4.7's "avoid cross-tenant pollution" rule,
//! since priority configs are keyed by `(tenantId, sectionId)` rather than
//! being a single global document.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::RoomsConfig;

/// Background-refreshed cache over the rooms/service-points document.
pub struct ConfigCache {
    path: Option<PathBuf>,
    cached: RwLock<RoomsConfig>,
    refresh_trigger: watch::Sender<()>,
}

impl ConfigCache {
    pub fn new(path: Option<PathBuf>, initial: RoomsConfig) -> Arc<Self> {
        let (refresh_trigger, _) = watch::channel(());
        Arc::new(Self { path, cached: RwLock::new(initial), refresh_trigger })
    }

    pub async fn get(&self) -> RoomsConfig {
        self.cached.read().await.clone()
    }

    async fn reload(&self) {
        let Some(path) = &self.path else { return };
        match RoomsConfig::load(path) {
            Ok(loaded) => {
                *self.cached.write().await = loaded;
            }
            Err(e) => {
                tracing::warn!(err = %e, path = %path.display(), "failed to reload rooms config, keeping cached copy");
            }
        }
    }

    /// Trigger an out-of-band refresh, e.g. after an admin write to the
    /// rooms document. A no-op if the refresh loop has not been spawned.
    pub fn trigger_refresh(&self) {
        let _ = self.refresh_trigger.send(());
    }
}

/// Spawn the background refresh loop: a periodic tick plus an
/// out-of-band trigger, the same shape as the registry eviction sweep.
pub fn spawn_refresh_loop(cache: Arc<ConfigCache>, interval: std::time::Duration, shutdown: CancellationToken) {
    let mut trigger_rx = cache.refresh_trigger.subscribe();
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
                changed = trigger_rx.changed() => if changed.is_err() { break },
            }
            cache.reload().await;
        }
    });
}

#[cfg(test)]
#[path = "config_cache_tests.rs"]
mod tests;
