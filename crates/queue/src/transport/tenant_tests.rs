// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn none_yields_global_context() -> anyhow::Result<()> {
    let ctx = parse_tenant_id(None)?;
    assert_eq!(ctx, TenantContext::global());
    Ok(())
}

#[test]
fn building_only_has_empty_section() -> anyhow::Result<()> {
    let ctx = parse_tenant_id(Some("hospA"))?;
    assert_eq!(ctx.tenant_id.as_deref(), Some("hospA"));
    assert_eq!(ctx.section_id.as_deref(), Some(""));
    Ok(())
}

#[test]
fn building_and_section_are_split_on_colon() -> anyhow::Result<()> {
    let ctx = parse_tenant_id(Some("hospA:ER"))?;
    assert_eq!(ctx.tenant_id.as_deref(), Some("hospA"));
    assert_eq!(ctx.section_id.as_deref(), Some("ER"));
    Ok(())
}

#[test]
fn whitespace_is_trimmed() -> anyhow::Result<()> {
    let ctx = parse_tenant_id(Some("  hospA : ER  "))?;
    assert_eq!(ctx.tenant_id.as_deref(), Some("hospA"));
    assert_eq!(ctx.section_id.as_deref(), Some("ER"));
    Ok(())
}

#[test]
fn empty_building_is_rejected() {
    let err = parse_tenant_id(Some(":ER"));
    assert!(matches!(err, Err(QueueError::Invalid(_))));
}

#[test]
fn blank_string_is_treated_as_global() -> anyhow::Result<()> {
    let ctx = parse_tenant_id(Some("   "))?;
    assert_eq!(ctx, TenantContext::global());
    Ok(())
}
