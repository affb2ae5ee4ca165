// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server configuration: CLI/env-driven process config, plus the on-disk
//! rooms document that tells the Engine and Registry which rooms exist.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the waiting-room queue server.
#[derive(Debug, Clone, clap::Parser)]
pub struct QueueConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "QUEUE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8900, env = "QUEUE_PORT")]
    pub port: u16,

    /// Path to the rooms configuration JSON file (waiting rooms + service points).
    #[arg(long, env = "QUEUE_ROOMS_CONFIG")]
    pub rooms_config: Option<PathBuf>,

    /// Accept admission into any `waitingRoomId`, even one not in the rooms config.
    #[arg(long, default_value_t = false, env = "QUEUE_ALLOW_WILDCARD_ROOMS")]
    pub allow_wildcard_rooms: bool,

    /// Service-point lease freshness window in seconds (spec §4.4: 5 minutes).
    #[arg(long, default_value_t = 300, env = "QUEUE_SERVICE_POINT_FRESH_SECS")]
    pub service_point_fresh_secs: u64,

    /// Service-point eviction age in seconds (spec §4.4: 10 minutes).
    #[arg(long, default_value_t = 600, env = "QUEUE_SERVICE_POINT_EVICT_SECS")]
    pub service_point_evict_secs: u64,

    /// Registry eviction sweep interval in seconds (spec §4.4: 5 minutes).
    #[arg(long, default_value_t = 300, env = "QUEUE_SERVICE_POINT_SWEEP_SECS")]
    pub service_point_sweep_secs: u64,

    /// Config cache refresh interval in seconds (spec §4.7: 30 seconds).
    #[arg(long, default_value_t = 30, env = "QUEUE_CONFIG_CACHE_REFRESH_SECS")]
    pub config_cache_refresh_secs: u64,

    /// Webhook target URL. If unset, webhook emission is disabled.
    #[arg(long, env = "QUEUE_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Webhook HTTP method.
    #[arg(long, default_value = "POST", env = "QUEUE_WEBHOOK_METHOD")]
    pub webhook_method: String,

    /// Webhook request timeout in milliseconds.
    #[arg(long, default_value_t = 5000, env = "QUEUE_WEBHOOK_TIMEOUT_MS")]
    pub webhook_timeout_ms: u64,

    /// Webhook retry count (linear backoff between attempts).
    #[arg(long, default_value_t = 3, env = "QUEUE_WEBHOOK_RETRIES")]
    pub webhook_retries: u32,

    /// Path to the sled database directory. If unset, the in-memory
    /// repository backend is used instead (suitable for tests/degraded mode).
    #[arg(long, env = "QUEUE_DB_PATH")]
    pub db_path: Option<PathBuf>,
}

impl QueueConfig {
    pub fn service_point_fresh_window(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.service_point_fresh_secs)
    }

    pub fn service_point_evict_age(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.service_point_evict_secs)
    }

    pub fn service_point_sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.service_point_sweep_secs)
    }

    pub fn config_cache_refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config_cache_refresh_secs)
    }

    pub fn webhook_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.webhook_timeout_ms)
    }
}

/// Static description of a single waiting room: which service points exist.
/// Service points are configured, not discovered — the Registry only tracks
/// which manager is currently logged in at a configured point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    pub waiting_room_id: String,
    pub service_points: Vec<String>,
}

/// The rooms document loaded from `--rooms-config`. See spec §4.5 step 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomsConfig {
    pub rooms: Vec<RoomConfig>,
}

impl RoomsConfig {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn room(&self, waiting_room_id: &str) -> Option<&RoomConfig> {
        self.rooms.iter().find(|r| r.waiting_room_id == waiting_room_id)
    }

    pub fn is_known_room(&self, waiting_room_id: &str) -> bool {
        self.room(waiting_room_id).is_some()
    }

    pub fn service_points(&self, waiting_room_id: &str) -> Vec<String> {
        self.room(waiting_room_id).map(|r| r.service_points.clone()).unwrap_or_default()
    }

    /// Index by room id for quick lookup when building the registry seed state.
    pub fn as_map(&self) -> HashMap<String, RoomConfig> {
        self.rooms.iter().map(|r| (r.waiting_room_id.clone(), r.clone())).collect()
    }
}
