// crates/skill-gate-policy/src/tests.rs
// ============================================================================
// Module: Policy Unit Tests
// Description: Table defaults and loader behavior.
// Purpose: Verify the policy data layer independent of the analyzer.
// Dependencies: skill-gate-policy
// ============================================================================

//! ## Overview
//! Unit tests for the policy tables; analyzer behavior is covered by the
//! integration tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use serde_json::json;

use crate::PolicyTables;
use crate::StaticGate;

#[test]
fn default_tables_cover_the_mvp_policy() {
    let tables = PolicyTables::default();
    assert!(tables.allowed_modules.contains("json"));
    assert!(tables.allowed_modules.contains("re"));
    assert!(!tables.allowed_modules.contains("os"));
    assert!(!tables.allowed_modules.contains("subprocess"));
    assert!(tables.forbidden_calls.contains("eval"));
    assert!(tables.forbidden_calls.contains("breakpoint"));
    assert!(tables.forbidden_attributes.contains("__subclasses__"));
    assert_eq!(tables.suspicious_patterns.len(), 6);
}

#[test]
fn loaded_tables_keep_defaults_for_omitted_fields() {
    let tables = PolicyTables::from_value(json!({
        "allowed_modules": ["json"]
    }))
    .expect("decode");
    assert_eq!(tables.allowed_modules.len(), 1);
    assert!(tables.forbidden_calls.contains("eval"));
    assert!(!tables.suspicious_patterns.is_empty());
}

#[test]
fn invalid_pattern_is_rejected_at_gate_construction() {
    let tables = PolicyTables::from_value(json!({
        "suspicious_patterns": ["("]
    }))
    .expect("decode");
    assert!(StaticGate::new(tables).is_err());
}
