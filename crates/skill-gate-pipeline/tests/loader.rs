// crates/skill-gate-pipeline/tests/loader.rs
// ============================================================================
// Module: Production Loader Tests
// Description: Registry-resolved loading, caching rules, and error categories.
// ============================================================================
//! ## Overview
//! Covers prod version resolution, manifest validation at load time,
//! distinct error categories, entry-point handles through the backend, and
//! the rule that unpinned lookups always re-read the registry.

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

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::EchoBackend;
use common::name;
use common::safe_manifest;
use common::version;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use skill_gate_core::ValidationRecord;
use skill_gate_pipeline::LoadError;
use skill_gate_pipeline::SkillLoader;
use skill_gate_registry::Registry;
use tempfile::TempDir;

/// Writes a prod artifact and registers it as the current prod version.
fn install_prod(dir: &TempDir, skill: &str, ver: &str, manifest: &Value) {
    let prod_dir = dir.path().join("skills_prod").join(skill).join(ver);
    std::fs::create_dir_all(&prod_dir).expect("prod dir");
    std::fs::write(prod_dir.join("skill.py"), "def action(value=None):\n    return value\n")
        .expect("write code");
    std::fs::write(
        prod_dir.join("skill.json"),
        serde_json::to_string_pretty(manifest).expect("encode"),
    )
    .expect("write manifest");

    let registry = Registry::new(dir.path().join("registry.json"));
    registry
        .add_staging(
            &name(skill),
            &version(ver),
            "c".repeat(64),
            "m".repeat(64),
            ValidationRecord::default(),
        )
        .expect("stage");
    registry.promote(&name(skill), &version(ver)).expect("promote");
}

fn loader_in(dir: &TempDir) -> SkillLoader {
    SkillLoader::new(
        dir.path().join("skills_prod"),
        dir.path().join("registry.json"),
        Arc::new(EchoBackend),
    )
    .expect("loader")
}

#[test]
fn load_resolves_current_prod_and_validates_manifest() {
    let dir = TempDir::new().expect("temp dir");
    install_prod(&dir, "text_echo", "1.0.0", &safe_manifest("text_echo", "1.0.0"));

    let loader = loader_in(&dir);
    let loaded = loader.load("text_echo", None).expect("load");
    assert_eq!(loaded.version, version("1.0.0"));
    assert_eq!(loaded.manifest.name, "text_echo");
    assert!(loaded.path.ends_with(Path::new("text_echo/1.0.0")));
}

#[test]
fn missing_prod_version_is_a_distinct_error() {
    let dir = TempDir::new().expect("temp dir");
    let loader = loader_in(&dir);
    let result = loader.load("ghost", None);
    assert!(matches!(result, Err(LoadError::NoProdVersion(_))));
}

#[test]
fn missing_artifact_file_is_a_distinct_error() {
    let dir = TempDir::new().expect("temp dir");
    install_prod(&dir, "text_echo", "1.0.0", &safe_manifest("text_echo", "1.0.0"));
    std::fs::remove_file(
        dir.path().join("skills_prod").join("text_echo").join("1.0.0").join("skill.py"),
    )
    .expect("remove code");

    let loader = loader_in(&dir);
    let result = loader.load("text_echo", None);
    assert!(matches!(result, Err(LoadError::MissingArtifact(_))));
}

#[test]
fn invalid_manifest_is_a_distinct_error() {
    let dir = TempDir::new().expect("temp dir");
    let mut manifest = safe_manifest("text_echo", "1.0.0");
    manifest["permissions"]["network"] = json!(true);
    install_prod(&dir, "text_echo", "1.0.0", &manifest);

    let loader = loader_in(&dir);
    let result = loader.load("text_echo", None);
    assert!(matches!(result, Err(LoadError::InvalidManifest(_))));
}

#[test]
fn handles_invoke_through_the_backend() {
    let dir = TempDir::new().expect("temp dir");
    install_prod(&dir, "text_echo", "1.0.0", &safe_manifest("text_echo", "1.0.0"));

    let loader = loader_in(&dir);
    let action = loader.action_handle("text_echo", None).expect("action handle");
    let mut input = Map::new();
    input.insert("value".to_string(), json!("payload"));
    let outcome = action.invoke(&input, Duration::from_secs(1)).expect("invoke");
    assert_eq!(outcome.value, Some(json!("payload")));

    let verify = loader.verify_handle("text_echo", None).expect("verify handle");
    let outcome = verify.invoke(Duration::from_secs(1)).expect("verify");
    assert!(outcome.passed);
}

#[test]
fn unpinned_lookup_sees_registry_updates() {
    let dir = TempDir::new().expect("temp dir");
    install_prod(&dir, "text_echo", "1.0.0", &safe_manifest("text_echo", "1.0.0"));

    let loader = loader_in(&dir);
    assert_eq!(loader.load("text_echo", None).expect("load").version, version("1.0.0"));

    // Promote a newer version after the first load; the next unpinned
    // lookup must re-read the registry and pick it up.
    install_prod(&dir, "text_echo", "1.1.0", &safe_manifest("text_echo", "1.1.0"));
    assert_eq!(loader.load("text_echo", None).expect("load").version, version("1.1.0"));

    // Pinned loads still resolve the older version.
    let pinned = loader.load("text_echo", Some(&version("1.0.0"))).expect("pinned load");
    assert_eq!(pinned.version, version("1.0.0"));
}
