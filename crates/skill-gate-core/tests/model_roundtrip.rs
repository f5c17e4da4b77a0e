// crates/skill-gate-core/tests/model_roundtrip.rs
// ============================================================================
// Module: Model Round-Trip Tests
// Description: Wire-form stability for identifiers, timestamps, and registry records.
// ============================================================================
//! ## Overview
//! Ensures the persisted shapes (registry, queue, timestamps, identifiers)
//! survive serialize/deserialize bit-for-bit, and that identifier grammar
//! boundaries hold.

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

use std::collections::BTreeMap;

use serde_json::json;
use skill_gate_core::AstGateRecord;
use skill_gate_core::ItemId;
use skill_gate_core::ItemStatus;
use skill_gate_core::QueueItem;
use skill_gate_core::RegistryData;
use skill_gate_core::SkillEntry;
use skill_gate_core::SkillName;
use skill_gate_core::SkillVersion;
use skill_gate_core::Timestamp;
use skill_gate_core::ValidationRecord;
use skill_gate_core::VersionId;
use skill_gate_core::VersionStatus;
use skill_gate_core::WorkQueue;

#[test]
fn skill_name_grammar_boundaries() {
    assert!(SkillName::new("abc").is_ok());
    assert!(SkillName::new(format!("a{}", "b".repeat(63))).is_ok());
    assert!(SkillName::new("ab").is_err());
    assert!(SkillName::new(format!("a{}", "b".repeat(64))).is_err());
    assert!(SkillName::new("1abc").is_err());
    assert!(SkillName::new("Abc").is_err());
    assert!(SkillName::new("a-bc").is_err());
    assert!(SkillName::new("text_echo").is_ok());
}

#[test]
fn version_grammar_boundaries() {
    assert!(VersionId::new("1.0.0").is_ok());
    assert!(VersionId::new("12.345.6789").is_ok());
    assert!(VersionId::new("1.0").is_err());
    assert!(VersionId::new("1.0.0.0").is_err());
    assert!(VersionId::new("v1.0.0").is_err());
    assert!(VersionId::new("1..0").is_err());
}

#[test]
fn timestamp_wire_form_is_second_precision_utc() {
    let stamp = Timestamp::parse("2026-02-01T10:00:00.123456789Z").expect("parse");
    assert_eq!(stamp.to_wire(), "2026-02-01T10:00:00Z");

    let offset = Timestamp::parse("2026-02-01T12:00:00+02:00").expect("parse");
    assert_eq!(offset.to_wire(), "2026-02-01T10:00:00Z");
}

#[test]
fn timestamp_round_trips_through_serde() {
    let stamp = Timestamp::parse("2026-02-01T10:00:00Z").expect("parse");
    let encoded = serde_json::to_string(&stamp).expect("encode");
    assert_eq!(encoded, "\"2026-02-01T10:00:00Z\"");
    let decoded: Timestamp = serde_json::from_str(&encoded).expect("decode");
    assert_eq!(decoded, stamp);
}

/// Builds a registry with one skill holding a staging version.
fn sample_registry() -> RegistryData {
    let name = SkillName::new("text_echo").expect("name");
    let version = VersionId::new("1.0.0").expect("version");
    let created_at = Timestamp::parse("2026-02-01T10:00:00Z").expect("stamp");

    let mut entry = SkillEntry::new(name.clone());
    entry.current_staging = Some(version.clone());
    entry.versions.insert(
        version.as_str().to_string(),
        SkillVersion {
            version,
            code_hash: "0".repeat(64),
            manifest_hash: "1".repeat(64),
            created_at,
            status: VersionStatus::Staging,
            validation: ValidationRecord {
                ast_gate: Some(AstGateRecord {
                    passed: true,
                    violations: Vec::new(),
                }),
                sandbox: None,
                promote_gate: None,
            },
            promoted_at: None,
            disabled_at: None,
            disabled_reason: None,
        },
    );

    let mut skills = BTreeMap::new();
    skills.insert(name.as_str().to_string(), entry);
    RegistryData {
        skills,
        updated_at: created_at,
    }
}

#[test]
fn registry_round_trips_through_json() {
    let registry = sample_registry();
    let encoded = serde_json::to_string_pretty(&registry).expect("encode");
    let decoded: RegistryData = serde_json::from_str(&encoded).expect("decode");
    assert_eq!(decoded, registry);
}

#[test]
fn registry_wire_shape_matches_contract() {
    let registry = sample_registry();
    let value = serde_json::to_value(&registry).expect("encode");
    assert!(value.get("skills").is_some());
    assert!(value.get("updated_at").is_some());
    let version = &value["skills"]["text_echo"]["versions"]["1.0.0"];
    assert_eq!(version["status"], json!("staging"));
    assert_eq!(version["validation"]["ast_gate"]["passed"], json!(true));
    assert!(version.get("promoted_at").is_none(), "null fields are omitted");
}

#[test]
fn queue_round_trips_through_json() {
    let queue = WorkQueue {
        items: vec![QueueItem {
            id: ItemId::new("item-1"),
            capability: "normalize filenames".to_string(),
            first_seen: Timestamp::parse("2026-02-01T10:00:00Z").expect("stamp"),
            occurrences: 3,
            context: "[MISSING: normalize filenames]".to_string(),
            status: ItemStatus::Pending,
        }],
        updated_at: Timestamp::parse("2026-02-01T10:05:00Z").expect("stamp"),
    };
    let encoded = serde_json::to_string(&queue).expect("encode");
    let decoded: WorkQueue = serde_json::from_str(&encoded).expect("decode");
    assert_eq!(decoded, queue);
    assert_eq!(decoded.pending_count(), 1);
}

#[test]
fn item_status_terminality() {
    assert!(!ItemStatus::Pending.is_terminal());
    assert!(!ItemStatus::Processing.is_terminal());
    assert!(ItemStatus::Completed.is_terminal());
    assert!(ItemStatus::Failed.is_terminal());
}
