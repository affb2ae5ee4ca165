// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the waiting-room queue server.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::Query;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Status, TenantContext};
use crate::engine::AdmissionRequest;
use crate::error::{QueueError, QueueResult};
use crate::state::AppState;
use crate::transport::tenant::parse_tenant_id;

// -- Request/response types ---------------------------------------------------

/// Accepts both full RFC-3339 (`2026-07-27T10:30:00Z`) and the second-less
/// ISO-8601 form (`2026-07-27T10:30Z`) spec §6 allows for `appointmentTime`.
fn deserialize_appointment_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else { return Ok(None) };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%MZ"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(&raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }
    Err(serde::de::Error::custom(format!("invalid appointmentTime {raw}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    /// Raw card/badge identifier. Card-reader parsing is a non-goal; this is
    /// only checked for non-emptiness.
    pub identifier: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_appointment_time")]
    pub appointment_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub manual_override: Option<f64>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub approximate_duration_seconds: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub entry_id: String,
    pub ticket_number: String,
    pub qr_url: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CallNextRequest {
    #[serde(default)]
    pub service_point_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InRoomRequest {
    pub entry_id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQueueQuery {
    #[serde(default, rename = "state")]
    pub state: Vec<String>,
    #[serde(default, rename = "tenantId")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLookupResponse {
    pub entry_id: String,
    pub ticket_number: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub eta_minutes: u32,
    pub can_cancel: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// -- Helpers ------------------------------------------------------------------

fn tenant_from(headers: &HeaderMap, query_tenant_id: Option<&str>) -> QueueResult<TenantContext> {
    let from_header = headers.get("X-Tenant-ID").and_then(|v| v.to_str().ok());
    parse_tenant_id(from_header.or(query_tenant_id))
}

fn parse_statuses(raw: &[String]) -> QueueResult<Option<Vec<Status>>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let parsed = raw
        .iter()
        .map(|s| match s.to_ascii_uppercase().as_str() {
            "WAITING" => Ok(Status::Waiting),
            "CALLED" => Ok(Status::Called),
            "IN_ROOM" => Ok(Status::InRoom),
            "IN_SERVICE" => Ok(Status::InService),
            "COMPLETED" => Ok(Status::Completed),
            "SKIPPED" => Ok(Status::Skipped),
            "CANCELLED" => Ok(Status::Cancelled),
            "NO_SHOW" => Ok(Status::NoShow),
            other => Err(QueueError::Invalid(format!("unknown status filter {other}"))),
        })
        .collect::<QueueResult<Vec<Status>>>()?;
    Ok(Some(parsed))
}

// -- Handlers -----------------------------------------------------------------

/// `GET /healthz`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `POST /waiting-rooms/{roomId}/swipe`
pub async fn swipe(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SwipeRequest>,
) -> Result<impl IntoResponse, QueueError> {
    if req.identifier.trim().is_empty() {
        return Err(QueueError::Invalid("identifier must not be empty".to_owned()));
    }

    let tenant = tenant_from(&headers, None)?;
    let admission = AdmissionRequest {
        tenant,
        symbols: req.symbols,
        appointment_time: req.appointment_time,
        age: req.age,
        manual_override: req.manual_override,
        service_id: req.service_id,
        service_name: req.service_name,
        approximate_duration_seconds: req.approximate_duration_seconds,
    };

    let entry = state.engine.create_entry(&room_id, admission).await?;

    let response = SwipeResponse {
        entry_id: entry.id.clone(),
        ticket_number: entry.ticket_number.clone(),
        qr_url: format!("/queue-entries/token/{}", entry.qr_token),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /waiting-rooms/{roomId}/next`
pub async fn call_next(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    body: Option<Json<CallNextRequest>>,
) -> Result<impl IntoResponse, QueueError> {
    let service_point_id = body.and_then(|Json(b)| b.service_point_id);
    let entry = state.engine.call_next(&room_id, service_point_id).await?;
    Ok(Json(entry))
}

/// `POST /waiting-rooms/{roomId}/service-points/{spId}/in-room`
pub async fn mark_in_room(
    State(state): State<Arc<AppState>>,
    Path((room_id, sp_id)): Path<(String, String)>,
    Json(req): Json<InRoomRequest>,
) -> Result<impl IntoResponse, QueueError> {
    let entry = state.engine.mark_in_room(&room_id, &sp_id, &req.entry_id).await?;
    Ok(Json(entry))
}

/// `POST /waiting-rooms/{roomId}/service-points/{spId}/finish`
pub async fn finish(
    State(state): State<Arc<AppState>>,
    Path((room_id, sp_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, QueueError> {
    let entry = state.engine.finish_current(&room_id, Some(&sp_id)).await?;
    Ok(Json(entry))
}

/// `GET /waiting-rooms/{roomId}/queue?state=...`
pub async fn list_queue(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ListQueueQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, QueueError> {
    let tenant = tenant_from(&headers, query.tenant_id.as_deref())?;
    let statuses = parse_statuses(&query.state)?;
    let entries = state.engine.get_entries(&room_id, tenant, statuses).await?;
    Ok(Json(entries))
}

/// `GET /queue-entries/token/{qrToken}` — public, no tenant/auth scoping.
pub async fn token_lookup(
    State(state): State<Arc<AppState>>,
    Path(qr_token): Path<String>,
) -> Result<impl IntoResponse, QueueError> {
    let entry = state.repository.get_by_qr_token(&qr_token).await?;
    Ok(Json(TokenLookupResponse {
        entry_id: entry.id.clone(),
        ticket_number: entry.ticket_number.clone(),
        status: entry.status,
        position: entry.position,
        eta_minutes: entry.eta_minutes(),
        can_cancel: entry.can_cancel(),
    }))
}

/// `POST /queue-entries/{entryId}/cancel` — supplemented route, see DESIGN.md.
pub async fn cancel_entry(
    State(state): State<Arc<AppState>>,
    Path(entry_id): Path<String>,
) -> Result<impl IntoResponse, QueueError> {
    let entry = state.repository.get_by_id(&entry_id).await?;
    let cancelled = state.engine.cancel_entry(&entry.waiting_room_id, &entry_id).await?;
    Ok(Json(cancelled))
}
