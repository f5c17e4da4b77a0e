// crates/skill-gate-pipeline/tests/evolver.rs
// ============================================================================
// Module: Evolution Controller Tests
// Description: Queue-to-staging flow, per-item fault isolation, audit trail.
// ============================================================================
//! ## Overview
//! Drives the controller through success, gate rejection, manifest
//! rejection, sandbox rejection, generator failures, and boundary cases
//! (empty queue, missing queue file, already-terminal items), asserting the
//! queue rewrite, registry state, and audit events.

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

use common::ScriptedGenerator;
use common::ScriptedSandbox;
use common::pending_item;
use common::queue_of;
use skill_gate_core::ItemStatus;
use skill_gate_core::VersionStatus;
use skill_gate_pipeline::EvolutionController;
use skill_gate_pipeline::EvolveConfig;
use skill_gate_pipeline::QueueStore;
use skill_gate_registry::Registry;
use tempfile::TempDir;

/// Builds a run configuration rooted in a temp directory.
fn config_in(dir: &TempDir, skip_sandbox: bool) -> EvolveConfig {
    EvolveConfig {
        queue_path: dir.path().join("queue.json"),
        staging_path: dir.path().join("skills_staging"),
        registry_path: dir.path().join("registry.json"),
        audit_log_path: Some(dir.path().join("audit.log")),
        skip_sandbox,
    }
}

/// Seeds the queue file with the given items.
fn seed_queue(config: &EvolveConfig, items: Vec<skill_gate_core::QueueItem>) {
    let store = QueueStore::new(&config.queue_path);
    let mut queue = queue_of(items);
    store.save(&mut queue).expect("seed queue");
}

fn audit_content(config: &EvolveConfig) -> String {
    config
        .audit_log_path
        .as_ref()
        .map(|path| std::fs::read_to_string(path).unwrap_or_default())
        .unwrap_or_default()
}

#[test]
fn empty_queue_yields_zero_summary() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);
    seed_queue(&config, vec![]);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config, &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.processed, 0);
    assert_eq!(report.summary.succeeded, 0);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.skipped, 0);
}

#[test]
fn missing_queue_file_is_treated_as_empty() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.processed, 0);
    assert!(config.queue_path.exists(), "queue is rewritten at end of run");
}

#[test]
fn successful_item_reaches_staging_and_registry() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);
    seed_queue(&config, vec![pending_item("a1", "echo text")]);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.processed, 1);
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed, 0);

    // Queue rewritten with terminal status.
    let queue = QueueStore::new(&config.queue_path).load().expect("load queue");
    assert_eq!(queue.items[0].status, ItemStatus::Completed);

    // Staging artifacts exist.
    let skill_dir = config.staging_path.join("stub_skill").join("1.0.0");
    assert!(skill_dir.join("skill.py").is_file());
    assert!(skill_dir.join("skill.json").is_file());

    // Registry holds the staging version with gate results and the code
    // hash matches the staged bytes.
    let entry = Registry::new(&config.registry_path)
        .get_entry("stub_skill")
        .expect("load registry")
        .expect("entry");
    let record = entry.versions.get("1.0.0").expect("version");
    assert_eq!(record.status, VersionStatus::Staging);
    let ast_gate = record.validation.ast_gate.as_ref().expect("ast record");
    assert!(ast_gate.passed);
    let staged_code = std::fs::read(skill_dir.join("skill.py")).expect("read staged code");
    let expected_hash = skill_gate_core::hashing::hash_bytes(
        skill_gate_core::DEFAULT_HASH_ALGORITHM,
        &staged_code,
    );
    assert_eq!(record.code_hash, expected_hash.into_hex());

    // Sandbox skipped is recorded.
    let sandbox_record = record.validation.sandbox.as_ref().expect("sandbox record");
    assert_eq!(sandbox_record.skipped, Some(true));
    assert_eq!(sandbox_record.passed, None);

    let audit = audit_content(&config);
    assert!(audit.contains("[GENERATE]"));
    assert!(audit.contains("[AST_GATE]"));
    assert!(audit.contains("[STAGING]"));
}

#[test]
fn hostile_code_is_rejected_by_the_static_gate() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);
    seed_queue(&config, vec![pending_item("a1", "echo text")]);

    let generator = ScriptedGenerator::hostile();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.failed, 1);
    let queue = QueueStore::new(&config.queue_path).load().expect("load queue");
    assert_eq!(queue.items[0].status, ItemStatus::Failed);

    let audit = audit_content(&config);
    assert!(audit.contains("[AST_GATE] skill=stub_skill passed=false"));
    // Rejected items never reach staging.
    assert!(!config.staging_path.join("stub_skill").exists());
}

#[test]
fn invalid_manifest_is_rejected_with_audit_detail() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);
    seed_queue(&config, vec![pending_item("a1", "echo text")]);

    let generator = ScriptedGenerator::overreaching();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.failed, 1);
    let audit = audit_content(&config);
    assert!(audit.contains("[MANIFEST_INVALID]"));
    assert!(audit.contains("network must be false"));
}

#[test]
fn sandbox_rejection_fails_the_item() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, false);
    seed_queue(&config, vec![pending_item("a1", "echo text")]);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: true,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert!(report.sandbox_active);
    assert_eq!(report.summary.failed, 1);

    let entry = Registry::new(&config.registry_path).get_entry("stub_skill").expect("load");
    assert!(entry.is_none(), "rejected artifacts never reach the registry");

    let audit = audit_content(&config);
    assert!(audit.contains("[SANDBOX] skill=stub_skill passed=false"));
}

#[test]
fn sandbox_pass_is_recorded_with_metrics() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, false);
    seed_queue(&config, vec![pending_item("a1", "echo text")]);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: true,
        pass: true,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.succeeded, 1);
    let entry = Registry::new(&config.registry_path)
        .get_entry("stub_skill")
        .expect("load")
        .expect("entry");
    let record = entry.versions.get("1.0.0").expect("version");
    let sandbox_record = record.validation.sandbox.as_ref().expect("sandbox record");
    assert_eq!(sandbox_record.passed, Some(true));
    assert!(sandbox_record.metrics.is_some());
}

#[test]
fn unavailable_sandbox_is_skipped_not_fatal() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, false);
    seed_queue(&config, vec![pending_item("a1", "echo text")]);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config, &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert!(!report.sandbox_active);
    assert_eq!(report.summary.succeeded, 1);
}

#[test]
fn unknown_capability_fails_with_generate_failed() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);
    seed_queue(&config, vec![pending_item("a1", "unknown wizardry")]);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.failed, 1);
    let audit = audit_content(&config);
    assert!(audit.contains("[GENERATE_FAILED]"));
}

#[test]
fn unexpected_generator_error_is_audited_as_error() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);
    seed_queue(&config, vec![pending_item("a1", "explode please")]);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.failed, 1);
    let audit = audit_content(&config);
    assert!(audit.contains("[ERROR]"));
    assert!(audit.contains("backend melted"));
}

#[test]
fn one_failure_never_aborts_the_batch() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);
    seed_queue(
        &config,
        vec![pending_item("a1", "unknown wizardry"), pending_item("a2", "echo text")],
    );

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.processed, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.succeeded, 1);

    let queue = QueueStore::new(&config.queue_path).load().expect("load queue");
    assert_eq!(queue.items[0].status, ItemStatus::Failed);
    assert_eq!(queue.items[1].status, ItemStatus::Completed);
}

#[test]
fn terminal_items_are_skipped_untouched() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir, true);
    let mut done = pending_item("a1", "echo text");
    done.status = ItemStatus::Completed;
    let mut failed = pending_item("a2", "echo text");
    failed.status = ItemStatus::Failed;
    seed_queue(&config, vec![done, failed, pending_item("a3", "echo text")]);

    let generator = ScriptedGenerator::safe();
    let sandbox = ScriptedSandbox {
        available: false,
        pass: false,
    };
    let report = EvolutionController::new(config.clone(), &generator, &sandbox)
        .expect("controller")
        .run()
        .expect("run");

    assert_eq!(report.summary.skipped, 2);
    assert_eq!(report.summary.processed, 1);

    let queue = QueueStore::new(&config.queue_path).load().expect("load queue");
    assert_eq!(queue.items[0].status, ItemStatus::Completed);
    assert_eq!(queue.items[1].status, ItemStatus::Failed);
    assert_eq!(queue.items[2].status, ItemStatus::Completed);
}
