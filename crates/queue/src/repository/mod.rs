// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence abstraction for queue entries. See spec §4.1.
//!
//! Two backends implement [`Repository`]: [`memory::MemoryRepository`] for
//! tests and degraded mode, and [`document::SledRepository`] for durable
//! storage.

pub mod document;
pub mod memory;

use async_trait::async_trait;

use crate::domain::{Entry, Status, TenantContext};
use crate::error::{QueueError, QueueResult};

/// Optional filter applied by [`Repository::list_by_room`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub tenant: TenantContext,
    pub statuses: Option<Vec<Status>>,
}

/// Persistence abstraction for queue entries. Implementors need not suspend
/// beyond the underlying store; all operations are tenant-filter-aware so no
/// implementation ever returns cross-tenant rows for a scoped query.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Assigns durable `id`, `ticketNumber` (`A-NNN`, monotonic per room), and
    /// a collision-checked `qrToken`. Rejects entries with an empty
    /// `waiting_room_id`.
    async fn create(&self, entry: Entry) -> QueueResult<Entry>;

    async fn get_by_id(&self, id: &str) -> QueueResult<Entry>;

    async fn get_by_qr_token(&self, token: &str) -> QueueResult<Entry>;

    /// Entries sorted by `position` ascending. Tenant filter (when present)
    /// is strict equality on both `tenant_id` and `section_id`.
    async fn list_by_room(&self, room_id: &str, filter: &ListFilter) -> QueueResult<Vec<Entry>>;

    async fn update_status(&self, id: &str, status: Status) -> QueueResult<Entry>;

    async fn update_position(&self, id: &str, position: u32) -> QueueResult<Entry>;

    async fn update_service_point(
        &self,
        id: &str,
        service_point: Option<String>,
    ) -> QueueResult<Entry>;

    /// The WAITING entry with minimum `position`, optionally restricted to a
    /// service point. Returns `Ok(None)` (not an error) when none match.
    async fn next_waiting(
        &self,
        room_id: &str,
        service_point: Option<&str>,
    ) -> QueueResult<Option<Entry>>;

    /// The entry in `{CALLED, IN_ROOM, IN_SERVICE}` for the room/window.
    async fn current_served(
        &self,
        room_id: &str,
        service_point: Option<&str>,
    ) -> QueueResult<Option<Entry>>;

    /// Reassigns `position = 1..N` over the current WAITING set in priority
    /// order (spec §4.5). Atomic with respect to readers: a concurrent
    /// `list_by_room` never observes a mixed state.
    async fn recalculate_positions(&self, room_id: &str) -> QueueResult<()>;

    async fn delete(&self, id: &str) -> QueueResult<()>;
}

/// Shared ordering relation used by every backend's `recalculate_positions`.
/// See spec §4.5 "Ordering relation".
pub fn cmp_waiting(a: &Entry, b: &Entry) -> std::cmp::Ordering {
    a.tier
        .cmp(&b.tier)
        .then_with(|| a.fitness_score.partial_cmp(&b.fitness_score).unwrap_or(std::cmp::Ordering::Equal))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.ticket_number.cmp(&b.ticket_number))
}

pub(crate) fn not_found(what: &str) -> QueueError {
    QueueError::NotFound(format!("{what} not found"))
}
