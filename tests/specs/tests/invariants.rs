// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the invariants and laws in the priority calculator
//! and the position-ordering relation.

use proptest::prelude::*;
use queue::domain::{calc, PriorityConfig};
use queue::repository::cmp_waiting;
use queue_specs::{arb_priority_input, epoch, waiting_entry};

proptest! {
    /// `calc` is a pure function: the same `(input, config, now)` always
    /// produces the same `(tier, score)`.
    #[test]
    fn calc_is_pure(input in arb_priority_input()) {
        let config = PriorityConfig::default_config();
        let now = epoch() + chrono::Duration::hours(1);

        let first = calc(&input, &config, now);
        let second = calc(&input, &config, now);
        prop_assert_eq!(first.0, second.0);
        prop_assert_eq!(first.1, second.1);
    }

    /// A STATIM entry always outranks a non-STATIM entry under the default
    /// config, regardless of arrival order.
    #[test]
    fn statim_always_outranks_non_statim(
        statim_offset in 0i64..86_400,
        plain_offset in 0i64..86_400,
    ) {
        let config = PriorityConfig::default_config();
        let now = epoch() + chrono::Duration::days(1);

        let statim_input = queue::domain::PriorityInput {
            symbols: vec!["STATIM".to_owned()],
            arrival_time: epoch() + chrono::Duration::seconds(statim_offset),
            appointment_time: None,
            age: None,
            manual_override: None,
        };
        let plain_input = queue::domain::PriorityInput {
            symbols: vec![],
            arrival_time: epoch() + chrono::Duration::seconds(plain_offset),
            appointment_time: None,
            age: None,
            manual_override: None,
        };

        let (statim_tier, _) = calc(&statim_input, &config, now);
        let (plain_tier, _) = calc(&plain_input, &config, now);
        prop_assert!(statim_tier < plain_tier);
    }

    /// For any permutation of a fixed set of (tier, score) pairs, sorting by
    /// `cmp_waiting` always yields the same order (the relation is a total,
    /// permutation-invariant order over the generated key space).
    #[test]
    fn cmp_waiting_is_permutation_invariant(
        mut keys in proptest::collection::vec((0u32..3, -100.0f64..100.0), 2..12)
    ) {
        let room = "room-a";
        let entries: Vec<_> = keys
            .drain(..)
            .enumerate()
            .map(|(i, (tier, score))| waiting_entry(room, i as u32, tier, score))
            .collect();

        let mut shuffled = entries.clone();
        shuffled.reverse();

        let mut sorted_a = entries.clone();
        sorted_a.sort_by(cmp_waiting);
        let mut sorted_b = shuffled;
        sorted_b.sort_by(cmp_waiting);

        let ids_a: Vec<_> = sorted_a.iter().map(|e| e.id.clone()).collect();
        let ids_b: Vec<_> = sorted_b.iter().map(|e| e.id.clone()).collect();
        prop_assert_eq!(ids_a, ids_b);
    }

    /// Sorting by `cmp_waiting` never places a lower-tier (less urgent) entry
    /// ahead of a higher-priority (lower tier, or same tier / lower score)
    /// entry — the ordering relation's core contract.
    #[test]
    fn cmp_waiting_respects_tier_then_score(
        mut keys in proptest::collection::vec((0u32..3, -100.0f64..100.0), 2..12)
    ) {
        let room = "room-a";
        let mut entries: Vec<_> = keys
            .drain(..)
            .enumerate()
            .map(|(i, (tier, score))| waiting_entry(room, i as u32, tier, score))
            .collect();
        entries.sort_by(cmp_waiting);

        for pair in entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ordered = a.tier < b.tier
                || (a.tier == b.tier && a.fitness_score <= b.fitness_score);
            prop_assert!(ordered);
        }
    }
}
