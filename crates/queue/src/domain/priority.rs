// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority calculator — a pure `(tier, score)` function over ticket
//! metadata and a per-tenant/section scoring configuration. See spec §4.2.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inputs the calculator reads off an entry (or admission request) to score it.
#[derive(Debug, Clone, Default)]
pub struct PriorityInput {
    pub symbols: Vec<String>,
    pub arrival_time: DateTime<Utc>,
    pub appointment_time: Option<DateTime<Utc>>,
    pub age: Option<u32>,
    pub manual_override: Option<f64>,
}

/// One tier-selection rule, evaluated in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierRule {
    pub id: u32,
    /// Matches when the entry carries any of these symbols (empty = any-match passes).
    #[serde(default)]
    pub symbols_any_of: Vec<String>,
    /// Matches only when the entry carries none of these symbols (empty = always passes).
    #[serde(default)]
    pub symbols_not_any_of: Vec<String>,
}

impl TierRule {
    fn matches(&self, symbols: &[String]) -> bool {
        let any_ok = self.symbols_any_of.is_empty()
            || self.symbols_any_of.iter().any(|s| symbols.contains(s));
        let not_ok =
            self.symbols_not_any_of.is_empty() || !self.symbols_not_any_of.iter().any(|s| symbols.contains(s));
        any_ok && not_ok
    }
}

/// Fitness contribution weights. Contribution evaluation order is fixed
/// (symbols, waiting time, appointment deviation, age, manual override) so
/// floating-point sums are bit-identical across backends for the same input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessWeights {
    #[serde(default)]
    pub symbol_weights: HashMap<String, f64>,
    pub waiting_weight_per_minute: f64,
    pub early_penalty_per_minute: f64,
    pub late_bonus_per_minute: f64,
    pub under6_per_year_younger: f64,
    pub senior_threshold: u32,
    pub over65_per_year_older: f64,
    pub manual_override: ManualOverrideWeight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualOverrideWeight {
    pub enabled: bool,
    pub weight: f64,
}

/// Per-tenant/section scoring rules. See spec §3 and §4.3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityConfig {
    pub version: u32,
    pub tiers: Vec<TierRule>,
    pub fitness: FitnessWeights,
}

impl PriorityConfig {
    /// The built-in default: STATIM > VIP > everyone else, with a modest
    /// waiting-time slope and the age/appointment slopes from the seed
    /// scenarios in spec §8.
    pub fn default_config() -> Self {
        let mut symbol_weights = HashMap::new();
        symbol_weights.insert("STATIM".to_owned(), -1000.0);
        symbol_weights.insert("VIP".to_owned(), -10.0);
        symbol_weights.insert("IMMOBILE".to_owned(), -5.0);

        PriorityConfig {
            version: 1,
            tiers: vec![
                TierRule { id: 0, symbols_any_of: vec!["STATIM".to_owned()], symbols_not_any_of: vec![] },
                TierRule { id: 1, symbols_any_of: vec![], symbols_not_any_of: vec![] },
            ],
            fitness: FitnessWeights {
                symbol_weights,
                waiting_weight_per_minute: -0.1,
                early_penalty_per_minute: 2.0,
                late_bonus_per_minute: -0.5,
                under6_per_year_younger: -5.0,
                senior_threshold: 65,
                over65_per_year_older: -1.0,
                manual_override: ManualOverrideWeight { enabled: true, weight: 1.0 },
            },
        }
    }
}

/// Select the matching tier. On no match, returns the last declared tier's id
/// (lowest priority), per spec §4.2.
fn select_tier(symbols: &[String], tiers: &[TierRule]) -> u32 {
    for tier in tiers {
        if tier.matches(symbols) {
            return tier.id;
        }
    }
    tiers.last().map(|t| t.id).unwrap_or(0)
}

/// Compute the fitness score. Contribution order is fixed per spec §4.2/§9
/// so identical inputs yield bit-identical sums.
fn fitness_score(input: &PriorityInput, config: &PriorityConfig, now: DateTime<Utc>) -> f64 {
    let mut score = 0.0;

    for symbol in &input.symbols {
        if let Some(w) = config.fitness.symbol_weights.get(symbol) {
            score += w;
        }
    }

    let waiting_minutes = (now - input.arrival_time).num_milliseconds() as f64 / 60_000.0;
    score += waiting_minutes * config.fitness.waiting_weight_per_minute;

    if let Some(appointment) = input.appointment_time {
        let dev_min = (now - appointment).num_milliseconds() as f64 / 60_000.0;
        if dev_min < 0.0 {
            score += (-dev_min) * config.fitness.early_penalty_per_minute;
        } else {
            score += dev_min * config.fitness.late_bonus_per_minute;
        }
    }

    if let Some(age) = input.age {
        if age < 6 {
            score += (6 - age) as f64 * config.fitness.under6_per_year_younger;
        }
        if age >= config.fitness.senior_threshold {
            score += (age - config.fitness.senior_threshold) as f64 * config.fitness.over65_per_year_older;
        }
    }

    if config.fitness.manual_override.enabled {
        if let Some(ov) = input.manual_override {
            score += ov * config.fitness.manual_override.weight;
        }
    }

    score
}

/// Pure `(tier, score)` calculation. Side-effect-free and reproducible given
/// the same `(input, config, now)`. See spec §4.2.
pub fn calc(input: &PriorityInput, config: &PriorityConfig, now: DateTime<Utc>) -> (u32, f64) {
    let tier = select_tier(&input.symbols, &config.tiers);
    let score = fitness_score(input, config, now);
    (tier, score)
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
