// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn custom(version: u32) -> PriorityConfig {
    let mut c = PriorityConfig::default_config();
    c.version = version;
    c
}

#[tokio::test]
async fn falls_back_to_default_when_nothing_saved() {
    let store = PriorityConfigStore::new();
    let resolved = store.get("hospA", "ER").await;
    assert_eq!(resolved.version, PriorityConfig::default_config().version);
}

#[tokio::test]
async fn section_specific_wins_over_tenant_level() {
    let store = PriorityConfigStore::new();
    store.save("hospA", "", custom(2)).await;
    store.save("hospA", "ER", custom(3)).await;

    assert_eq!(store.get("hospA", "ER").await.version, 3);
    assert_eq!(store.get("hospA", "ICU").await.version, 2);
}

#[tokio::test]
async fn never_falls_back_across_tenants() {
    let store = PriorityConfigStore::new();
    store.save("hospA", "", custom(2)).await;

    let resolved = store.get("hospB", "ER").await;
    assert_eq!(resolved.version, PriorityConfig::default_config().version);
}

#[tokio::test]
async fn save_is_an_upsert() {
    let store = PriorityConfigStore::new();
    store.save("hospA", "ER", custom(3)).await;
    store.save("hospA", "ER", custom(4)).await;
    assert_eq!(store.get("hospA", "ER").await.version, 4);
}
