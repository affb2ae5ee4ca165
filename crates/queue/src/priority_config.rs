// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority Config Store — per-tenant/section scoring rules with
//! most-specific-wins fallback. See spec §4.3.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::PriorityConfig;

/// `(tenantId, sectionId)` key pair. An empty `sectionId` means "tenant-level
/// config", used as the fallback for any section under that tenant.
type ConfigKey = (String, String);

/// Resolves `(tenantId, sectionId)` most-specific first: exact match, then
/// `(tenantId, "")`, then the built-in default. Never falls back across
/// tenants — a miss on one tenant's config never reads another tenant's.
pub struct PriorityConfigStore {
    configs: RwLock<HashMap<ConfigKey, PriorityConfig>>,
    default: PriorityConfig,
}

impl PriorityConfigStore {
    pub fn new() -> Self {
        Self { configs: RwLock::new(HashMap::new()), default: PriorityConfig::default_config() }
    }

    pub async fn get(&self, tenant_id: &str, section_id: &str) -> PriorityConfig {
        let configs = self.configs.read().await;
        if let Some(c) = configs.get(&(tenant_id.to_owned(), section_id.to_owned())) {
            return c.clone();
        }
        if !section_id.is_empty() {
            if let Some(c) = configs.get(&(tenant_id.to_owned(), String::new())) {
                return c.clone();
            }
        }
        self.default.clone()
    }

    pub async fn save(&self, tenant_id: &str, section_id: &str, config: PriorityConfig) {
        let mut configs = self.configs.write().await;
        configs.insert((tenant_id.to_owned(), section_id.to_owned()), config);
    }
}

impl Default for PriorityConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "priority_config_tests.rs"]
mod tests;
