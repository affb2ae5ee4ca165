// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state wiring the Repository, Engine, Hub, Registry,
//! Priority Config Store, and Config Cache together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::config_cache::ConfigCache;
use crate::engine::QueueEngine;
use crate::hub::Hub;
use crate::priority_config::PriorityConfigStore;
use crate::registry::ServicePointRegistry;
use crate::repository::Repository;

/// Shared queue-server state handed to every HTTP/WS handler.
pub struct AppState {
    pub config: QueueConfig,
    pub repository: Arc<dyn Repository>,
    pub engine: Arc<QueueEngine>,
    pub hub: Arc<Hub>,
    pub registry: Arc<ServicePointRegistry>,
    pub priority_configs: Arc<PriorityConfigStore>,
    pub config_cache: Arc<ConfigCache>,
    pub shutdown: CancellationToken,
}
