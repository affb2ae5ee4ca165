// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Waiting-room queue server: a priority/fitness scheduler with tenant-scoped
//! real-time fan-out.

pub mod config;
pub mod config_cache;
pub mod domain;
pub mod engine;
pub mod error;
pub mod hub;
pub mod priority_config;
pub mod registry;
pub mod repository;
pub mod state;
pub mod transport;
pub mod webhook;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::{QueueConfig, RoomsConfig};
use crate::config_cache::{spawn_refresh_loop, ConfigCache};
use crate::engine::QueueEngine;
use crate::hub::{spawn_notifier, Hub};
use crate::priority_config::PriorityConfigStore;
use crate::registry::{spawn_eviction_sweep, ServicePointRegistry};
use crate::repository::document::SledRepository;
use crate::repository::memory::MemoryRepository;
use crate::repository::Repository;
use crate::state::AppState;
use crate::transport::build_router;
use crate::webhook::spawn_sender;

/// Run the queue server until shutdown.
pub async fn run(config: QueueConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let rooms_config = match &config.rooms_config {
        Some(path) => RoomsConfig::load(path)?,
        None => RoomsConfig::default(),
    };

    let repository: Arc<dyn Repository> = match &config.db_path {
        Some(path) => Arc::new(SledRepository::open(path)?),
        None => Arc::new(MemoryRepository::new()),
    };

    let priority_configs = Arc::new(PriorityConfigStore::new());

    let registry = Arc::new(ServicePointRegistry::new(
        &rooms_config,
        config.service_point_fresh_window(),
        config.service_point_evict_age(),
    ));
    spawn_eviction_sweep(Arc::clone(&registry), config.service_point_sweep_interval(), shutdown.clone());

    let config_cache = ConfigCache::new(config.rooms_config.clone(), rooms_config.clone());
    spawn_refresh_loop(Arc::clone(&config_cache), config.config_cache_refresh_interval(), shutdown.clone());

    let hub = Arc::new(Hub::new(Arc::clone(&repository)));
    let notify = spawn_notifier(Arc::clone(&hub), shutdown.clone());

    let webhook_tx = spawn_sender(
        config.webhook_url.clone(),
        config.webhook_method.clone(),
        config.webhook_timeout(),
        config.webhook_retries,
        shutdown.clone(),
    );

    let engine = Arc::new(QueueEngine::new(
        Arc::clone(&repository),
        Arc::clone(&priority_configs),
        Arc::clone(&registry),
        rooms_config,
        config.allow_wildcard_rooms,
        notify,
        webhook_tx,
        shutdown.clone(),
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        repository,
        engine,
        hub,
        registry,
        priority_configs,
        config_cache,
        shutdown: shutdown.clone(),
    });

    tracing::info!("waitingroom-queue listening on {addr}");
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
