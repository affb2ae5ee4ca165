// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain error taxonomy for the queue server, mapped to HTTP status codes
//! at the transport boundary. See spec §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors surfaced by the Repository, Engine, Registry, and Config
/// Store, flowing unchanged from the Engine to the HTTP adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Malformed body, unknown room, missing identifier, bad config.
    Invalid(String),
    /// Unknown entry, token, tenant, or config.
    NotFound(String),
    /// Single-service-point invariant or duplicate `qrToken`.
    Conflict(String),
    /// `call-next` with nothing waiting. Distinguished in the payload from `NotFound`.
    Empty(String),
    /// No configured service points for the room.
    Unavailable(String),
    /// Repository or other infrastructure failure.
    Internal(String),
}

impl QueueError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Empty(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "INVALID",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Empty(_) => "EMPTY",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Invalid(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Empty(m)
            | Self::Unavailable(m)
            | Self::Internal(m) => m,
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody { code: self.as_code().to_owned(), message: self.message().to_owned() }
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_code(), self.message())
    }
}

impl std::error::Error for QueueError {}

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = ErrorResponse { error: self.to_error_body() };
        (status, Json(body)).into_response()
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

pub type QueueResult<T> = Result<T, QueueError>;
