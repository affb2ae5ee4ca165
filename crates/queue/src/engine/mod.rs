// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Queue Engine — creation, ordering, state transitions, position
//! recomputation, call/finish semantics. See spec §4.5.
//!
//! Locking discipline: one `tokio::sync::Mutex<()>` per `waitingRoomId`,
//! created race-free behind a `RwLock<HashMap<...>>` the same way
//! `state::MuxState` guards its session table. Every public method acquires
//! the room mutex before touching the Repository or Registry, and never
//! holds two room mutexes at once.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::RoomsConfig;
use crate::domain::{self, Entry, PriorityInput, Status, TenantContext};
use crate::error::{QueueError, QueueResult};
use crate::priority_config::PriorityConfigStore;
use crate::registry::ServicePointRegistry;
use crate::repository::{ListFilter, Repository};
use crate::webhook::{WebhookEvent, WebhookSender};

/// Fields accepted on admission. Identifier/card data is opaque to the
/// Engine; only the fields that feed ordering or linking matter here.
#[derive(Debug, Clone, Default)]
pub struct AdmissionRequest {
    pub tenant: TenantContext,
    pub symbols: Vec<String>,
    pub appointment_time: Option<chrono::DateTime<Utc>>,
    pub age: Option<u32>,
    pub manual_override: Option<f64>,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub approximate_duration_seconds: Option<u32>,
}

type NotifyFn = dyn Fn(String, String) + Send + Sync;

/// Owns all state transitions and the position ordering.
pub struct QueueEngine {
    repository: Arc<dyn Repository>,
    priority_configs: Arc<PriorityConfigStore>,
    registry: Arc<ServicePointRegistry>,
    rooms_config: RoomsConfig,
    allow_wildcard_rooms: bool,
    room_locks: tokio::sync::RwLock<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    /// Registered by the Hub at wiring time in `lib.rs::run`. The Engine
    /// never references the Hub type directly.
    notify: Arc<NotifyFn>,
    webhook_tx: WebhookSender,
    shutdown: CancellationToken,
}

impl QueueEngine {
    pub fn new(
        repository: Arc<dyn Repository>,
        priority_configs: Arc<PriorityConfigStore>,
        registry: Arc<ServicePointRegistry>,
        rooms_config: RoomsConfig,
        allow_wildcard_rooms: bool,
        notify: Arc<NotifyFn>,
        webhook_tx: WebhookSender,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            repository,
            priority_configs,
            registry,
            rooms_config,
            allow_wildcard_rooms,
            room_locks: tokio::sync::RwLock::new(HashMap::new()),
            notify,
            webhook_tx,
            shutdown,
        }
    }

    async fn room_lock(&self, room_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        if let Some(lock) = self.room_locks.read().await.get(room_id) {
            return Arc::clone(lock);
        }
        let mut locks = self.room_locks.write().await;
        Arc::clone(locks.entry(room_id.to_owned()).or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))))
    }

    fn check_room(&self, room_id: &str) -> QueueResult<()> {
        if self.allow_wildcard_rooms || self.rooms_config.is_known_room(room_id) {
            Ok(())
        } else {
            Err(QueueError::Invalid(format!("unknown waiting room {room_id}")))
        }
    }

    fn check_cancelled(&self) -> QueueResult<()> {
        if self.shutdown.is_cancelled() {
            Err(QueueError::Internal("server is shutting down".to_owned()))
        } else {
            Ok(())
        }
    }

    /// `CreateEntry`. See spec §4.5 "Admission".
    pub async fn create_entry(&self, room_id: &str, req: AdmissionRequest) -> QueueResult<Entry> {
        self.check_cancelled()?;
        self.check_room(room_id)?;

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let service_point = self.registry.available(room_id).await.ok();

        let tenant_id = req.tenant.tenant_id.clone().unwrap_or_default();
        let section_id = req.tenant.section_id.clone().unwrap_or_default();
        let config = self.priority_configs.get(&tenant_id, &section_id).await;

        let now = Utc::now();
        let input = PriorityInput {
            symbols: req.symbols.clone(),
            arrival_time: now,
            appointment_time: req.appointment_time,
            age: req.age,
            manual_override: req.manual_override,
        };
        let (tier, fitness_score) = domain::calc(&input, &config, now);

        let entry = Entry {
            id: String::new(),
            ticket_number: String::new(),
            qr_token: String::new(),
            waiting_room_id: room_id.to_owned(),
            tenant_id,
            section_id,
            status: Status::Waiting,
            position: None,
            service_point,
            symbols: req.symbols,
            appointment_time: req.appointment_time,
            age: req.age,
            manual_override: req.manual_override,
            tier,
            fitness_score,
            service_id: req.service_id,
            service_name: req.service_name,
            approximate_duration_seconds: req.approximate_duration_seconds,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.create(entry).await?;
        self.repository.recalculate_positions(room_id).await?;
        let stored = self.repository.get_by_id(&stored.id).await?;

        self.notify_and_unlock(room_id, &stored.tenant_id, _guard);
        Ok(stored)
    }

    /// `CallNext(roomId, servicePointId?)`. See spec §4.5.
    pub async fn call_next(&self, room_id: &str, service_point: Option<String>) -> QueueResult<Entry> {
        self.check_cancelled()?;
        self.check_room(room_id)?;

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let resolved_sp = match service_point {
            Some(sp) => {
                let busy = self.repository.current_served(room_id, Some(&sp)).await?;
                if busy.is_some() {
                    return Err(QueueError::Conflict(format!(
                        "service point {sp} already has an active entry"
                    )));
                }
                Some(sp)
            }
            None => Some(self.registry.available(room_id).await?),
        };

        let next = self
            .repository
            .next_waiting(room_id, resolved_sp.as_deref())
            .await?
            .ok_or_else(|| QueueError::Empty(format!("no entries waiting in room {room_id}")))?;

        self.repository.update_service_point(&next.id, resolved_sp).await?;
        let called = self.repository.update_status(&next.id, Status::Called).await?;
        self.repository.recalculate_positions(room_id).await?;
        let called = self.repository.get_by_id(&called.id).await?;

        let _ = self.webhook_tx.send(WebhookEvent {
            event: "ticket_called",
            ticket_id: called.id.clone(),
            state: called.status,
            timestamp: called.updated_at,
            room_id: room_id.to_owned(),
            service_point_id: called.service_point.clone(),
            user_id: None,
        });
        self.notify_and_unlock(room_id, &called.tenant_id, _guard);
        Ok(called)
    }

    /// `MarkInRoom(roomId, servicePointId, entryId)`. See spec §4.5.
    pub async fn mark_in_room(&self, room_id: &str, service_point: &str, entry_id: &str) -> QueueResult<Entry> {
        self.check_cancelled()?;

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let entry = self.repository.get_by_id(entry_id).await?;
        if entry.status != Status::Called || entry.service_point.as_deref() != Some(service_point) {
            return Err(QueueError::Conflict(format!(
                "entry {entry_id} is not CALLED at service point {service_point}"
            )));
        }

        let updated = self.repository.update_status(entry_id, Status::InRoom).await?;
        let _ = self.webhook_tx.send(WebhookEvent {
            event: "ticket_state_changed",
            ticket_id: updated.id.clone(),
            state: updated.status,
            timestamp: updated.updated_at,
            room_id: room_id.to_owned(),
            service_point_id: updated.service_point.clone(),
            user_id: None,
        });
        self.notify_and_unlock(room_id, &updated.tenant_id, _guard);
        Ok(updated)
    }

    /// `FinishCurrent(roomId [, servicePointId])`. See spec §4.5.
    pub async fn finish_current(&self, room_id: &str, service_point: Option<&str>) -> QueueResult<Entry> {
        self.check_cancelled()?;

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let active = self
            .repository
            .current_served(room_id, service_point)
            .await?
            .ok_or_else(|| QueueError::Empty(format!("no active entry in room {room_id}")))?;

        let completed = self.repository.update_status(&active.id, Status::Completed).await?;
        self.repository.recalculate_positions(room_id).await?;

        let _ = self.webhook_tx.send(WebhookEvent {
            event: "ticket_completed",
            ticket_id: completed.id.clone(),
            state: completed.status,
            timestamp: completed.updated_at,
            room_id: room_id.to_owned(),
            service_point_id: completed.service_point.clone(),
            user_id: None,
        });
        self.notify_and_unlock(room_id, &completed.tenant_id, _guard);
        Ok(completed)
    }

    /// `GetEntries(roomId, tenantId, sectionId, statuses)`. See spec §4.5.
    pub async fn get_entries(
        &self,
        room_id: &str,
        tenant: TenantContext,
        statuses: Option<Vec<Status>>,
    ) -> QueueResult<Vec<Entry>> {
        self.check_cancelled()?;
        self.repository.list_by_room(room_id, &ListFilter { tenant, statuses }).await
    }

    /// Cancel a WAITING entry. Not one of spec §4.5's named operations, but
    /// required by `can_cancel` and the `PATCH /entries/{id}/cancel` route
    /// in the HTTP contract (spec §6).
    pub async fn cancel_entry(&self, room_id: &str, entry_id: &str) -> QueueResult<Entry> {
        self.check_cancelled()?;

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let entry = self.repository.get_by_id(entry_id).await?;
        if !entry.can_cancel() {
            return Err(QueueError::Conflict(format!("entry {entry_id} can no longer be cancelled")));
        }

        let updated = self.repository.update_status(entry_id, Status::Cancelled).await?;
        self.repository.recalculate_positions(room_id).await?;
        self.notify_and_unlock(room_id, &updated.tenant_id, _guard);
        Ok(updated)
    }

    /// Invoke the registered notify callback. Takes the lock guard only to
    /// make explicit, at the call site, that notification happens while the
    /// room lock is still logically "ours" for this operation — the
    /// callback itself only enqueues a broadcast request and never performs
    /// a network write (spec §4.6), so holding the guard through the call
    /// is safe and matches "never hold a room mutex while writing to a
    /// subscriber".
    fn notify_and_unlock(&self, room_id: &str, tenant_id: &str, _guard: tokio::sync::MutexGuard<'_, ()>) {
        (self.notify)(room_id.to_owned(), tenant_id.to_owned());
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
