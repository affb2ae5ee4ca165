// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent in-memory `Repository` backend. Used for tests and degraded
//! mode when no `--db-path` is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{Entry, Status};
use crate::error::{QueueError, QueueResult};

use super::{cmp_waiting, not_found, ListFilter, Repository};

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    qr_index: HashMap<String, String>,
    ticket_counters: HashMap<String, u64>,
}

/// `RwLock<HashMap<...>>`-backed repository, mirroring the session-table
/// style used elsewhere in this codebase's shared state.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create(&self, mut entry: Entry) -> QueueResult<Entry> {
        if entry.waiting_room_id.is_empty() {
            return Err(QueueError::Invalid("waitingRoomId must not be empty".to_owned()));
        }

        let mut inner = self.inner.write().await;

        let counter = inner.ticket_counters.entry(entry.waiting_room_id.clone()).or_insert(0);
        *counter += 1;
        let ticket_number = format!("A-{:03}", *counter);

        let mut qr_token = uuid::Uuid::new_v4().to_string();
        while inner.qr_index.contains_key(&qr_token) {
            qr_token = uuid::Uuid::new_v4().to_string();
        }

        entry.id = uuid::Uuid::new_v4().to_string();
        entry.ticket_number = ticket_number;
        entry.qr_token = qr_token.clone();
        let now = Utc::now();
        entry.created_at = now;
        entry.updated_at = now;

        inner.qr_index.insert(qr_token, entry.id.clone());
        inner.entries.insert(entry.id.clone(), entry.clone());

        Ok(entry)
    }

    async fn get_by_id(&self, id: &str) -> QueueResult<Entry> {
        self.inner.read().await.entries.get(id).cloned().ok_or_else(|| not_found("entry"))
    }

    async fn get_by_qr_token(&self, token: &str) -> QueueResult<Entry> {
        let inner = self.inner.read().await;
        let id = inner.qr_index.get(token).ok_or_else(|| not_found("entry"))?;
        inner.entries.get(id).cloned().ok_or_else(|| not_found("entry"))
    }

    async fn list_by_room(&self, room_id: &str, filter: &ListFilter) -> QueueResult<Vec<Entry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<Entry> = inner
            .entries
            .values()
            .filter(|e| e.waiting_room_id == room_id)
            .filter(|e| filter.tenant.matches(&e.tenant_id, &e.section_id))
            .filter(|e| match &filter.statuses {
                Some(statuses) => statuses.contains(&e.status),
                None => true,
            })
            .cloned()
            .collect();

        entries.sort_by(|a, b| match (a.status, b.status) {
            (Status::Waiting, Status::Waiting) => {
                a.position.unwrap_or(u32::MAX).cmp(&b.position.unwrap_or(u32::MAX))
            }
            _ => b.updated_at.cmp(&a.updated_at),
        });
        Ok(entries)
    }

    async fn update_status(&self, id: &str, status: Status) -> QueueResult<Entry> {
        let mut inner = self.inner.write().await;
        let entry = inner.entries.get_mut(id).ok_or_else(|| not_found("entry"))?;
        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn update_position(&self, id: &str, position: u32) -> QueueResult<Entry> {
        let mut inner = self.inner.write().await;
        let entry = inner.entries.get_mut(id).ok_or_else(|| not_found("entry"))?;
        entry.position = Some(position);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn update_service_point(
        &self,
        id: &str,
        service_point: Option<String>,
    ) -> QueueResult<Entry> {
        let mut inner = self.inner.write().await;
        let entry = inner.entries.get_mut(id).ok_or_else(|| not_found("entry"))?;
        entry.service_point = service_point;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn next_waiting(
        &self,
        room_id: &str,
        service_point: Option<&str>,
    ) -> QueueResult<Option<Entry>> {
        let inner = self.inner.read().await;
        let mut candidates: Vec<&Entry> = inner
            .entries
            .values()
            .filter(|e| e.waiting_room_id == room_id && e.status == Status::Waiting)
            .filter(|e| match service_point {
                Some(sp) => match e.service_point.as_deref() {
                    Some(s) => s == sp,
                    None => true,
                },
                None => true,
            })
            .collect();
        candidates.sort_by_key(|e| e.position.unwrap_or(u32::MAX));
        Ok(candidates.into_iter().next().cloned())
    }

    async fn current_served(
        &self,
        room_id: &str,
        service_point: Option<&str>,
    ) -> QueueResult<Option<Entry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .values()
            .find(|e| {
                e.waiting_room_id == room_id
                    && e.status.occupies_service_point()
                    && match service_point {
                        Some(sp) => e.service_point.as_deref() == Some(sp),
                        None => true,
                    }
            })
            .cloned())
    }

    async fn recalculate_positions(&self, room_id: &str) -> QueueResult<()> {
        let mut inner = self.inner.write().await;
        let mut waiting: Vec<String> = inner
            .entries
            .values()
            .filter(|e| e.waiting_room_id == room_id && e.status == Status::Waiting)
            .map(|e| e.id.clone())
            .collect();
        waiting.sort_by(|a, b| {
            let ea = &inner.entries[a];
            let eb = &inner.entries[b];
            cmp_waiting(ea, eb)
        });
        let now = Utc::now();
        for (idx, id) in waiting.into_iter().enumerate() {
            if let Some(entry) = inner.entries.get_mut(&id) {
                entry.position = Some(idx as u32 + 1);
                entry.updated_at = now;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> QueueResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner.entries.remove(id).ok_or_else(|| not_found("entry"))?;
        inner.qr_index.remove(&entry.qr_token);
        Ok(())
    }
}
