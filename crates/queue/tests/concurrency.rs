// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent-admission invariants against `MemoryRepository` directly:
//! QR token uniqueness and position contiguity under load.

use std::sync::Arc;

use queue::domain::{Entry, Status};
use queue::repository::memory::MemoryRepository;
use queue::repository::{ListFilter, Repository};

const ADMISSIONS: usize = 1000;

fn blank_entry(room_id: &str) -> Entry {
    let now = chrono::Utc::now();
    Entry {
        id: String::new(),
        ticket_number: String::new(),
        qr_token: String::new(),
        waiting_room_id: room_id.to_owned(),
        tenant_id: String::new(),
        section_id: String::new(),
        status: Status::Waiting,
        position: None,
        service_point: None,
        symbols: Vec::new(),
        appointment_time: None,
        age: None,
        manual_override: None,
        tier: 1,
        fitness_score: 0.0,
        service_id: None,
        service_name: None,
        approximate_duration_seconds: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn concurrent_admissions_yield_unique_tokens_and_contiguous_positions() {
    let repository = Arc::new(MemoryRepository::new());
    let room_id = "room-a";

    let mut handles = Vec::with_capacity(ADMISSIONS);
    for _ in 0..ADMISSIONS {
        let repository = Arc::clone(&repository);
        let room_id = room_id.to_owned();
        handles.push(tokio::spawn(async move {
            repository.create(blank_entry(&room_id)).await.expect("create entry")
        }));
    }

    let mut created = Vec::with_capacity(ADMISSIONS);
    for handle in handles {
        created.push(handle.await.expect("task join"));
    }

    let mut qr_tokens: Vec<&str> = created.iter().map(|e| e.qr_token.as_str()).collect();
    qr_tokens.sort_unstable();
    qr_tokens.dedup();
    assert_eq!(qr_tokens.len(), ADMISSIONS, "qr tokens must be unique across all admissions");

    let mut ids: Vec<&str> = created.iter().map(|e| e.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), ADMISSIONS, "entry ids must be unique across all admissions");

    repository.recalculate_positions(room_id).await.expect("recalculate positions");

    let entries = repository
        .list_by_room(room_id, &ListFilter::default())
        .await
        .expect("list by room");
    assert_eq!(entries.len(), ADMISSIONS);

    let mut positions: Vec<u32> = entries.iter().map(|e| e.position.expect("position assigned")).collect();
    positions.sort_unstable();
    let expected: Vec<u32> = (1..=ADMISSIONS as u32).collect();
    assert_eq!(positions, expected, "positions must be contiguous 1..=N with no gaps or duplicates");
}
