// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use chrono::Utc;

use super::*;
use crate::domain::{Entry, Status};
use crate::repository::memory::MemoryRepository;

fn entry(room: &str, tenant: &str, section: &str) -> Entry {
    Entry {
        id: String::new(),
        ticket_number: String::new(),
        qr_token: String::new(),
        waiting_room_id: room.to_owned(),
        tenant_id: tenant.to_owned(),
        section_id: section.to_owned(),
        status: Status::Waiting,
        position: None,
        service_point: None,
        symbols: vec![],
        appointment_time: None,
        age: None,
        manual_override: None,
        tier: 1,
        fitness_score: 0.0,
        service_id: None,
        service_name: None,
        approximate_duration_seconds: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn snapshot_is_tenant_isolated() -> anyhow::Result<()> {
    let repo = Arc::new(MemoryRepository::new());
    repo.create(entry("room-1", "hospA", "ER")).await?;
    repo.create(entry("room-1", "hospB", "ER")).await?;

    let hub = Hub::new(repo);
    let snapshot = hub.snapshot("room-1", "hospA").await?;
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.entries[0].tenant_id, "hospA");
    Ok(())
}

#[tokio::test]
async fn broadcast_reaches_only_matching_tenant_subscribers() -> anyhow::Result<()> {
    let repo = Arc::new(MemoryRepository::new());
    repo.create(entry("room-1", "hospA", "ER")).await?;

    let hub = Hub::new(repo);
    let (_id_a, mut rx_a) = hub.subscribe("room-1", "hospA").await;
    let (_id_b, mut rx_b) = hub.subscribe("room-1", "hospB").await;

    hub.broadcast("room-1", "hospA").await;

    let msg = rx_a.try_recv()?;
    assert!(msg.contains("hospA"));
    assert!(rx_b.try_recv().is_err(), "hospB subscriber must not receive a hospA broadcast");
    Ok(())
}

#[tokio::test]
async fn unsubscribe_stops_further_broadcasts() {
    let repo = Arc::new(MemoryRepository::new());
    let hub = Hub::new(repo);
    let (id, mut rx) = hub.subscribe("room-1", "hospA").await;
    hub.unsubscribe("room-1", "hospA", id).await;

    hub.broadcast("room-1", "hospA").await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn dead_sender_is_pruned_on_next_broadcast() {
    let repo = Arc::new(MemoryRepository::new());
    let hub = Hub::new(repo);
    let (_id, rx) = hub.subscribe("room-1", "hospA").await;
    drop(rx);

    hub.broadcast("room-1", "hospA").await;

    let rooms = hub.rooms.read().await;
    let remaining = rooms.get("room-1").and_then(|r| r.by_tenant.get("hospA")).map(|s| s.len()).unwrap_or(0);
    assert_eq!(remaining, 0);
}
