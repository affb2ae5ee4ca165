// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sled`-backed durable `Repository`. `sled` is the pure-Rust embedded store
//! used here in place of the heavier `rocksdb`/`mongodb` options seen
//! elsewhere in this corpus — appropriate for a single-process queue server.
//!
//! Trees: `entries` (by id, JSON-encoded), `by_qr_token` (token -> id). The
//! `(waitingRoomId)`, `(status)`, and `(position)` "indexes" described in the
//! persistence contract are scans over `entries` rather than separate sled
//! trees — opening either tree can fail independently, and a failure there is
//! logged and degrades to a full scan rather than aborting startup.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Entry, Status};
use crate::error::{QueueError, QueueResult};

use super::{cmp_waiting, not_found, ListFilter, Repository};

pub struct SledRepository {
    db: sled::Db,
    entries: sled::Tree,
    qr_index: Option<sled::Tree>,
}

impl SledRepository {
    pub fn open(path: &std::path::Path) -> anyhow::Result<Self> {
        let db = sled::open(path)?;
        let entries = db.open_tree("entries")?;
        let qr_index = match db.open_tree("by_qr_token") {
            Ok(tree) => Some(tree),
            Err(e) => {
                tracing::warn!(err = %e, "failed to open qr_token index, falling back to full scan");
                None
            }
        };
        Ok(Self { db, entries, qr_index })
    }

    fn get_entry(&self, id: &str) -> QueueResult<Option<Entry>> {
        let bytes = self.entries.get(id).map_err(|e| QueueError::Internal(e.to_string()))?;
        match bytes {
            Some(b) => {
                let entry: Entry =
                    serde_json::from_slice(&b).map_err(|e| QueueError::Internal(e.to_string()))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    fn put_entry(&self, entry: &Entry) -> QueueResult<()> {
        let bytes = serde_json::to_vec(entry).map_err(|e| QueueError::Internal(e.to_string()))?;
        self.entries.insert(&entry.id, bytes).map_err(|e| QueueError::Internal(e.to_string()))?;
        Ok(())
    }

    fn scan_room(&self, room_id: &str) -> QueueResult<Vec<Entry>> {
        let mut out = Vec::new();
        for item in self.entries.iter() {
            let (_, bytes) = item.map_err(|e| QueueError::Internal(e.to_string()))?;
            let entry: Entry =
                serde_json::from_slice(&bytes).map_err(|e| QueueError::Internal(e.to_string()))?;
            if entry.waiting_room_id == room_id {
                out.push(entry);
            }
        }
        Ok(out)
    }

    fn next_ticket_number(&self, room_id: &str) -> QueueResult<String> {
        let key = format!("ticket_counter:{room_id}");
        let next = self
            .db
            .update_and_fetch(key.as_bytes(), |old| {
                let n: u64 = old
                    .and_then(|b| b.try_into().ok())
                    .map(u64::from_be_bytes)
                    .unwrap_or(0)
                    + 1;
                Some(n.to_be_bytes().to_vec())
            })
            .map_err(|e| QueueError::Internal(e.to_string()))?
            .map(|b| u64::from_be_bytes(b.as_ref().try_into().unwrap_or([0; 8])))
            .unwrap_or(1);
        Ok(format!("A-{next:03}"))
    }

    fn qr_token_exists(&self, token: &str) -> QueueResult<bool> {
        match &self.qr_index {
            Some(tree) => {
                Ok(tree.contains_key(token).map_err(|e| QueueError::Internal(e.to_string()))?)
            }
            None => Ok(self.scan_qr_token(token)?.is_some()),
        }
    }

    fn scan_qr_token(&self, token: &str) -> QueueResult<Option<String>> {
        for item in self.entries.iter() {
            let (_, bytes) = item.map_err(|e| QueueError::Internal(e.to_string()))?;
            let entry: Entry =
                serde_json::from_slice(&bytes).map_err(|e| QueueError::Internal(e.to_string()))?;
            if entry.qr_token == token {
                return Ok(Some(entry.id));
            }
        }
        Ok(None)
    }

    fn qr_token_to_id(&self, token: &str) -> QueueResult<Option<String>> {
        match &self.qr_index {
            Some(tree) => {
                let v = tree.get(token).map_err(|e| QueueError::Internal(e.to_string()))?;
                Ok(v.map(|b| String::from_utf8_lossy(&b).into_owned()))
            }
            None => self.scan_qr_token(token),
        }
    }
}

#[async_trait]
impl Repository for SledRepository {
    async fn create(&self, mut entry: Entry) -> QueueResult<Entry> {
        if entry.waiting_room_id.is_empty() {
            return Err(QueueError::Invalid("waitingRoomId must not be empty".to_owned()));
        }

        entry.id = uuid::Uuid::new_v4().to_string();
        entry.ticket_number = self.next_ticket_number(&entry.waiting_room_id)?;

        let mut qr_token = uuid::Uuid::new_v4().to_string();
        while self.qr_token_exists(&qr_token)? {
            qr_token = uuid::Uuid::new_v4().to_string();
        }
        entry.qr_token = qr_token.clone();

        let now = Utc::now();
        entry.created_at = now;
        entry.updated_at = now;

        self.put_entry(&entry)?;
        if let Some(tree) = &self.qr_index {
            tree.insert(qr_token.as_bytes(), entry.id.as_bytes())
                .map_err(|e| QueueError::Internal(e.to_string()))?;
        }

        Ok(entry)
    }

    async fn get_by_id(&self, id: &str) -> QueueResult<Entry> {
        self.get_entry(id)?.ok_or_else(|| not_found("entry"))
    }

    async fn get_by_qr_token(&self, token: &str) -> QueueResult<Entry> {
        let id = self.qr_token_to_id(token)?.ok_or_else(|| not_found("entry"))?;
        self.get_entry(&id)?.ok_or_else(|| not_found("entry"))
    }

    async fn list_by_room(&self, room_id: &str, filter: &ListFilter) -> QueueResult<Vec<Entry>> {
        let mut entries: Vec<Entry> = self
            .scan_room(room_id)?
            .into_iter()
            .filter(|e| filter.tenant.matches(&e.tenant_id, &e.section_id))
            .filter(|e| match &filter.statuses {
                Some(statuses) => statuses.contains(&e.status),
                None => true,
            })
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
        let mut entry = self.get_entry(id)?.ok_or_else(|| not_found("entry"))?;
        entry.status = status;
        entry.updated_at = Utc::now();
        self.put_entry(&entry)?;
        Ok(entry)
    }

    async fn update_position(&self, id: &str, position: u32) -> QueueResult<Entry> {
        let mut entry = self.get_entry(id)?.ok_or_else(|| not_found("entry"))?;
        entry.position = Some(position);
        entry.updated_at = Utc::now();
        self.put_entry(&entry)?;
        Ok(entry)
    }

    async fn update_service_point(
        &self,
        id: &str,
        service_point: Option<String>,
    ) -> QueueResult<Entry> {
        let mut entry = self.get_entry(id)?.ok_or_else(|| not_found("entry"))?;
        entry.service_point = service_point;
        entry.updated_at = Utc::now();
        self.put_entry(&entry)?;
        Ok(entry)
    }

    async fn next_waiting(
        &self,
        room_id: &str,
        service_point: Option<&str>,
    ) -> QueueResult<Option<Entry>> {
        let mut candidates: Vec<Entry> = self
            .scan_room(room_id)?
            .into_iter()
            .filter(|e| e.status == Status::Waiting)
            .filter(|e| match service_point {
                Some(sp) => match e.service_point.as_deref() {
                    Some(s) => s == sp,
                    None => true,
                },
                None => true,
            })
            .collect();
        candidates.sort_by_key(|e| e.position.unwrap_or(u32::MAX));
        Ok(candidates.into_iter().next())
    }

    async fn current_served(
        &self,
        room_id: &str,
        service_point: Option<&str>,
    ) -> QueueResult<Option<Entry>> {
        Ok(self.scan_room(room_id)?.into_iter().find(|e| {
            e.status.occupies_service_point()
                && match service_point {
                    Some(sp) => e.service_point.as_deref() == Some(sp),
                    None => true,
                }
        }))
    }

    async fn recalculate_positions(&self, room_id: &str) -> QueueResult<()> {
        let mut waiting: Vec<Entry> = self
            .scan_room(room_id)?
            .into_iter()
            .filter(|e| e.status == Status::Waiting)
            .collect();
        waiting.sort_by(cmp_waiting);

        let now = Utc::now();
        // Apply all position writes as a single sled transaction so a
        // concurrent reader of `entries` never observes a mixed ordering.
        self.entries
            .transaction(|tx| {
                for (idx, entry) in waiting.iter().enumerate() {
                    let mut updated = entry.clone();
                    updated.position = Some(idx as u32 + 1);
                    updated.updated_at = now;
                    let bytes = serde_json::to_vec(&updated).unwrap_or_default();
                    tx.insert(updated.id.as_bytes(), bytes)?;
                }
                Ok::<_, sled::transaction::ConflictableTransactionError<()>>(())
            })
            .map_err(|e| QueueError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> QueueResult<()> {
        let entry = self.get_entry(id)?.ok_or_else(|| not_found("entry"))?;
        self.entries.remove(id).map_err(|e| QueueError::Internal(e.to_string()))?;
        if let Some(tree) = &self.qr_index {
            tree.remove(entry.qr_token.as_bytes())
                .map_err(|e| QueueError::Internal(e.to_string()))?;
        }
        Ok(())
    }
}
