// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Entry` — a ticket issued to one visitor in a waiting room.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Waiting,
    Called,
    InRoom,
    InService,
    Completed,
    Skipped,
    Cancelled,
    NoShow,
}

impl Status {
    /// Statuses that occupy a service point per the single-service-point invariant.
    pub fn occupies_service_point(self) -> bool {
        matches!(self, Status::Called | Status::InRoom | Status::InService)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Waiting => "WAITING",
            Status::Called => "CALLED",
            Status::InRoom => "IN_ROOM",
            Status::InService => "IN_SERVICE",
            Status::Completed => "COMPLETED",
            Status::Skipped => "SKIPPED",
            Status::Cancelled => "CANCELLED",
            Status::NoShow => "NO_SHOW",
        }
    }
}

/// A ticket issued to one visitor. See spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub ticket_number: String,
    pub qr_token: String,

    pub waiting_room_id: String,
    pub tenant_id: String,
    pub section_id: String,

    pub status: Status,

    /// 1-based position within the room's WAITING set. Computed, not authoritative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_point: Option<String>,

    pub symbols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_override: Option<f64>,

    pub tier: u32,
    pub fitness_score: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approximate_duration_seconds: Option<u32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// ETA in minutes for a waiting entry, per spec §6: `max(0, (position-1) * 5)`.
    pub fn eta_minutes(&self) -> u32 {
        match self.position {
            Some(p) if p > 0 => (p - 1) * 5,
            _ => 0,
        }
    }

    pub fn can_cancel(&self) -> bool {
        self.status == Status::Waiting
    }
}

/// The tenant scoping key threaded explicitly through calls, never ambient.
/// `tenant_id` is the building, `section_id` the department; both empty means
/// "no tenant context" (a global/admin query).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TenantContext {
    pub tenant_id: Option<String>,
    pub section_id: Option<String>,
}

impl TenantContext {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn new(tenant_id: impl Into<String>, section_id: impl Into<String>) -> Self {
        Self { tenant_id: Some(tenant_id.into()), section_id: Some(section_id.into()) }
    }

    /// The normalized key used by the Hub to group subscribers: `"default"` when absent.
    pub fn tenant_key(&self) -> String {
        match &self.tenant_id {
            Some(t) if !t.is_empty() => t.clone(),
            _ => "default".to_owned(),
        }
    }

    /// Whether an entry matches this context's tenant/section filter.
    /// A global context (no tenant) matches everything.
    pub fn matches(&self, entry_tenant: &str, entry_section: &str) -> bool {
        let tenant_ok = match &self.tenant_id {
            Some(t) => t == entry_tenant,
            None => true,
        };
        let section_ok = match &self.section_id {
            Some(s) => s == entry_section,
            None => true,
        };
        tenant_ok && section_ok
    }
}
