// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant ID parsing: `building[:section]`, trimmed, empty building
//! rejected. See spec §6.

use crate::domain::TenantContext;
use crate::error::QueueError;

/// Parse a raw tenant identifier into a [`TenantContext`]. `None` input
/// yields the global context (no tenant scoping).
pub fn parse_tenant_id(raw: Option<&str>) -> Result<TenantContext, QueueError> {
    let Some(raw) = raw else { return Ok(TenantContext::global()) };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(TenantContext::global());
    }

    let mut parts = trimmed.splitn(2, ':');
    let building = parts.next().unwrap_or("").trim();
    let section = parts.next().unwrap_or("").trim();

    if building.is_empty() {
        return Err(QueueError::Invalid("tenant id must not have an empty building".to_owned()));
    }

    Ok(TenantContext::new(building, section))
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tests;
