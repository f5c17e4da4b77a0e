// crates/skill-gate-core/tests/hashing.rs
// ============================================================================
// Module: Canonical Hashing Tests
// Description: Verifies SHA-256 and canonical JSON hashing behavior.
// ============================================================================
//! ## Overview
//! Ensures digests are deterministic across key ordering, match known
//! vectors, and distinguish distinct canonical content.

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

use proptest::prelude::any;
use proptest::prelude::proptest;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use skill_gate_core::HashAlgorithm;
use skill_gate_core::hashing::canonical_json_bytes;
use skill_gate_core::hashing::hash_bytes;
use skill_gate_core::hashing::hash_canonical_json;

#[test]
fn hash_bytes_matches_known_vector() {
    let digest = hash_bytes(HashAlgorithm::Sha256, b"abc");
    assert_eq!(
        digest.as_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn canonical_hash_is_order_independent_for_maps() {
    let mut map_a = Map::new();
    map_a.insert("b".to_string(), json!(2));
    map_a.insert("a".to_string(), json!(1));

    let mut map_b = Map::new();
    map_b.insert("a".to_string(), json!(1));
    map_b.insert("b".to_string(), json!(2));

    let hash_a =
        hash_canonical_json(HashAlgorithm::Sha256, &Value::Object(map_a)).expect("hash a");
    let hash_b =
        hash_canonical_json(HashAlgorithm::Sha256, &Value::Object(map_b)).expect("hash b");

    assert_eq!(hash_a, hash_b);
}

#[test]
fn canonical_bytes_have_no_extraneous_whitespace() {
    let value = json!({"outer": {"inner": [1, 2, 3]}, "flag": true});
    let bytes = canonical_json_bytes(&value).expect("canonical bytes");
    let text = String::from_utf8(bytes).expect("utf8");
    assert!(!text.contains(' '));
    assert!(!text.contains('\n'));
}

#[test]
fn distinct_content_produces_distinct_digests() {
    let hash_a = hash_canonical_json(HashAlgorithm::Sha256, &json!({"k": 1})).expect("hash a");
    let hash_b = hash_canonical_json(HashAlgorithm::Sha256, &json!({"k": 2})).expect("hash b");
    assert_ne!(hash_a, hash_b);
}

#[test]
fn code_hash_is_over_utf8_bytes() {
    let code = "def action():\n    return {\"ok\": True}\n";
    let digest_a = hash_bytes(HashAlgorithm::Sha256, code.as_bytes());
    let digest_b = hash_bytes(HashAlgorithm::Sha256, code.as_bytes());
    assert_eq!(digest_a, digest_b);
    assert_eq!(digest_a.as_hex().len(), 64);
    assert!(digest_a.as_hex().chars().all(|c| c.is_ascii_hexdigit()));
}

proptest! {
    #[test]
    fn hashing_is_deterministic(payload in any::<Vec<u8>>()) {
        let first = hash_bytes(HashAlgorithm::Sha256, &payload);
        let second = hash_bytes(HashAlgorithm::Sha256, &payload);
        assert_eq!(first, second);
    }

    #[test]
    fn canonical_hash_is_deterministic_for_strings(text in ".*") {
        let value = json!({ "text": text });
        let first = hash_canonical_json(HashAlgorithm::Sha256, &value).expect("hash");
        let second = hash_canonical_json(HashAlgorithm::Sha256, &value).expect("hash");
        assert_eq!(first, second);
    }
}
