// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared generators for the property tests in `tests/invariants.rs`.

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use queue::domain::{Entry, PriorityInput, Status};

/// A fixed reference instant so generated `created_at`/`appointment_time`
/// offsets are reproducible within a single test run.
pub fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .expect("fixed RFC-3339 literal")
        .with_timezone(&Utc)
}

const SYMBOL_POOL: &[&str] = &["STATIM", "VIP", "IMMOBILE", "PREGNANT"];

/// Zero to two symbols drawn from the known weighted set.
pub fn arb_symbols() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(proptest::sample::select(SYMBOL_POOL), 0..=2)
        .prop_map(|v| v.into_iter().map(str::to_owned).collect())
}

/// A `PriorityInput` with arrival jittered within a day and an optional age.
pub fn arb_priority_input() -> impl Strategy<Value = PriorityInput> {
    (arb_symbols(), 0i64..86_400, proptest::option::of(0u32..110))
        .prop_map(|(symbols, arrival_offset_secs, age)| PriorityInput {
            symbols,
            arrival_time: epoch() + Duration::seconds(arrival_offset_secs),
            appointment_time: None,
            age,
            manual_override: None,
        })
}

/// A minimal WAITING `Entry` for a given room, distinguished by `seq` so
/// `ticket_number`/`created_at` break ties deterministically.
pub fn waiting_entry(room_id: &str, seq: u32, tier: u32, fitness_score: f64) -> Entry {
    let created_at = epoch() + Duration::seconds(i64::from(seq));
    Entry {
        id: format!("entry-{seq}"),
        ticket_number: format!("A-{seq:03}"),
        qr_token: format!("qr-{seq}"),
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
        tier,
        fitness_score,
        service_id: None,
        service_name: None,
        approximate_duration_seconds: None,
        created_at,
        updated_at: created_at,
    }
}
