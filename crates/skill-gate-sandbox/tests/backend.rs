// crates/skill-gate-sandbox/tests/backend.rs
// ============================================================================
// Module: Interpreter Backend Tests
// Description: Entry-point invocation, strict verification, and timeouts.
// ============================================================================
//! ## Overview
//! Drives real artifacts through the interpreter backend: probing, action
//! invocation, the strict-`true` verify rule, exit-bypass defeat, and the
//! process-boundary timeout. Tests return early on hosts without a `python3`
//! interpreter.

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

use std::process::Command;
use std::time::Duration;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use skill_gate_core::ArtifactBackend;
use skill_gate_core::BackendError;
use skill_gate_sandbox::InterpreterBackend;
use tempfile::TempDir;

/// Returns true when a `python3` interpreter is reachable.
fn python_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Writes an artifact source into a fresh temp directory.
fn write_artifact(code: &str) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("skill.py"), code).expect("write skill");
    dir
}

fn input(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
}

const ECHO_SKILL: &str = r#"
def action(text):
    return {"result": text.upper()}


def verify():
    return action("ok")["result"] == "OK"
"#;

#[test]
fn probe_reports_entry_points() {
    if !python_available() {
        return;
    }
    let dir = write_artifact(ECHO_SKILL);
    let backend = InterpreterBackend::new();
    let symbols = backend.probe(dir.path()).expect("probe");
    assert!(symbols.has_action);
    assert!(symbols.has_verify);
}

#[test]
fn probe_missing_artifact_is_a_typed_error() {
    if !python_available() {
        return;
    }
    let dir = TempDir::new().expect("temp dir");
    let backend = InterpreterBackend::new();
    let err = backend.probe(dir.path()).expect_err("missing artifact");
    assert!(matches!(err, BackendError::MissingArtifact(_)));
}

#[test]
fn action_invocation_returns_the_value() {
    if !python_available() {
        return;
    }
    let dir = write_artifact(ECHO_SKILL);
    let backend = InterpreterBackend::new();
    let outcome = backend
        .invoke_action(dir.path(), &input(&[("text", json!("hello"))]), Duration::from_secs(10))
        .expect("invoke");
    assert_eq!(outcome.value, Some(json!({"result": "HELLO"})));
    assert!(outcome.error.is_none());
    assert!(!outcome.timed_out);
}

#[test]
fn action_exception_is_a_case_error_not_a_crash() {
    if !python_available() {
        return;
    }
    let dir = write_artifact("def action(text):\n    raise ValueError(\"bad input\")\n");
    let backend = InterpreterBackend::new();
    let outcome = backend
        .invoke_action(dir.path(), &input(&[("text", json!("x"))]), Duration::from_secs(10))
        .expect("invoke");
    assert!(outcome.value.is_none());
    let error = outcome.error.expect("error detail");
    assert!(error.contains("ValueError"), "{error}");
}

#[test]
fn missing_action_is_reported_as_an_error() {
    if !python_available() {
        return;
    }
    let dir = write_artifact("def verify():\n    return True\n");
    let backend = InterpreterBackend::new();
    let outcome = backend
        .invoke_action(dir.path(), &Map::new(), Duration::from_secs(10))
        .expect("invoke");
    assert!(outcome.error.expect("error").contains("no action()"));
}

#[test]
fn action_timeout_kills_the_process() {
    if !python_available() {
        return;
    }
    let dir = write_artifact(
        "def action(**kwargs):\n    while True:\n        pass\n\n\ndef verify():\n    return True\n",
    );
    let backend = InterpreterBackend::new();
    let outcome = backend
        .invoke_action(dir.path(), &Map::new(), Duration::from_millis(500))
        .expect("invoke");
    assert!(outcome.timed_out);
    assert_eq!(outcome.error.as_deref(), Some("timeout"));
    assert!(outcome.duration_ms >= 500);
}

#[test]
fn verify_passes_only_on_exact_true() {
    if !python_available() {
        return;
    }
    let backend = InterpreterBackend::new();

    let strict = write_artifact(ECHO_SKILL);
    let outcome = backend.invoke_verify(strict.path(), Duration::from_secs(10)).expect("verify");
    assert!(outcome.passed, "{}", outcome.detail);

    // Truthy integer 1 must fail the strict check.
    let truthy = write_artifact("def action():\n    return 1\n\n\ndef verify():\n    return 1\n");
    let outcome = backend.invoke_verify(truthy.path(), Duration::from_secs(10)).expect("verify");
    assert!(!outcome.passed);
    assert!(outcome.detail.contains('1'), "{}", outcome.detail);
}

#[test]
fn system_exit_bypass_is_defeated() {
    if !python_available() {
        return;
    }
    let dir = write_artifact(
        "def action():\n    return {}\n\n\ndef verify():\n    raise SystemExit(0)\n",
    );
    let backend = InterpreterBackend::new();
    let outcome = backend.invoke_verify(dir.path(), Duration::from_secs(10)).expect("verify");
    assert!(!outcome.passed);
    assert!(outcome.detail.starts_with("VERIFICATION_FAILED:"), "{}", outcome.detail);
    assert!(outcome.detail.contains("SystemExit"), "{}", outcome.detail);
}

#[test]
fn verify_missing_entry_point_fails_with_detail() {
    if !python_available() {
        return;
    }
    let dir = write_artifact("def action():\n    return {}\n");
    let backend = InterpreterBackend::new();
    let outcome = backend.invoke_verify(dir.path(), Duration::from_secs(10)).expect("verify");
    assert!(!outcome.passed);
    assert!(outcome.detail.contains("verify"), "{}", outcome.detail);
}

#[test]
fn missing_artifact_fails_verify_without_error() {
    let dir = TempDir::new().expect("temp dir");
    let backend = InterpreterBackend::new();
    let outcome = backend.invoke_verify(dir.path(), Duration::from_secs(1)).expect("verify");
    assert!(!outcome.passed);
    assert!(outcome.detail.contains("not found"));
}

/// The backend rejects a directory path that exists but has no source even
/// when the interpreter is absent, because the check is filesystem-side.
#[test]
fn action_missing_artifact_is_reported_without_interpreter() {
    let dir = TempDir::new().expect("temp dir");
    let backend = InterpreterBackend::new();
    let outcome = backend
        .invoke_action(dir.path(), &Map::new(), Duration::from_secs(1))
        .expect("invoke");
    assert!(outcome.error.expect("error").contains("not found"));
}
