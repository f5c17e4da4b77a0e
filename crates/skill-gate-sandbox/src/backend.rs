// crates/skill-gate-sandbox/src/backend.rs
// ============================================================================
// Module: Interpreter Artifact Backend
// Description: Subprocess-per-invocation execution of interpreted artifacts.
// Purpose: Expose action/verify entry points with process-boundary timeouts.
// Dependencies: serde_json, skill-gate-core, std::process
// ============================================================================

//! ## Overview
//! The interpreter backend implements [`ArtifactBackend`] by shelling out to
//! a Python interpreter for every invocation: a small driver program loads
//! the artifact from its directory, performs the requested entry-point call,
//! and reports through a sentinel line protocol on stdout. Timeouts are
//! enforced at the process boundary (poll then kill), which is the only
//! trustworthy cancel for untrusted code. Each invocation is a fresh
//! process; no artifact state survives between calls.
//!
//! In-artifact failures (missing entry point, raised exception, timeout) are
//! reported inside the outcome; [`BackendError`] is reserved for backend
//! infrastructure failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use serde_json::Map;
use serde_json::Value;
use skill_gate_core::ActionOutcome;
use skill_gate_core::ArtifactBackend;
use skill_gate_core::ArtifactSymbols;
use skill_gate_core::BackendError;
use skill_gate_core::VerifyOutcome;

use crate::runner::HARNESS_SOURCE;

// ============================================================================
// SECTION: Drivers
// ============================================================================

/// Driver that loads the artifact and reports which entry points exist.
const PROBE_DRIVER: &str = r#"
import importlib.util
import sys


def main() -> int:
    skill_file = "%s/skill.py" % sys.argv[1]
    spec = importlib.util.spec_from_file_location("skill", skill_file)
    if spec is None or spec.loader is None:
        print("PROBE_ERROR: cannot load skill module from %s" % skill_file)
        return 1
    module = importlib.util.module_from_spec(spec)
    try:
        spec.loader.exec_module(module)
    except BaseException as exc:
        print("PROBE_ERROR: %s: %s" % (type(exc).__name__, exc))
        return 1
    action = "true" if callable(getattr(module, "action", None)) else "false"
    verify = "true" if callable(getattr(module, "verify", None)) else "false"
    print("PROBE_RESULT action=%s verify=%s" % (action, verify))
    return 0


if __name__ == "__main__":
    sys.exit(main())
"#;

/// Driver that invokes `action` with named arguments read from stdin.
const ACTION_DRIVER: &str = r#"
import importlib.util
import json
import sys


def main() -> int:
    try:
        payload = json.load(sys.stdin)
    except BaseException as exc:
        print("ACTION_ERROR: invalid input payload: %s" % exc)
        return 1
    skill_file = "%s/skill.py" % sys.argv[1]
    spec = importlib.util.spec_from_file_location("skill", skill_file)
    if spec is None or spec.loader is None:
        print("ACTION_ERROR: cannot load skill module from %s" % skill_file)
        return 1
    module = importlib.util.module_from_spec(spec)
    try:
        spec.loader.exec_module(module)
    except BaseException as exc:
        print("ACTION_ERROR: %s: %s" % (type(exc).__name__, exc))
        return 1
    action = getattr(module, "action", None)
    if not callable(action):
        print("ACTION_ERROR: skill has no action() function")
        return 1
    try:
        result = action(**payload)
    except BaseException as exc:
        print("ACTION_ERROR: %s: %s" % (type(exc).__name__, exc))
        return 1
    print("ACTION_RESULT " + json.dumps(result, default=str))
    return 0


if __name__ == "__main__":
    sys.exit(main())
"#;

/// Sentinel prefix for a successful action result.
const ACTION_RESULT_PREFIX: &str = "ACTION_RESULT ";
/// Sentinel prefix for an in-artifact action failure.
const ACTION_ERROR_PREFIX: &str = "ACTION_ERROR: ";
/// Sentinel prefix for an in-artifact probe failure.
const PROBE_ERROR_PREFIX: &str = "PROBE_ERROR: ";
/// Sentinel prefix for a probe report line.
const PROBE_RESULT_PREFIX: &str = "PROBE_RESULT ";
/// Sentinel line for a passed verification.
const VERIFY_SUCCESS_SENTINEL: &str = "VERIFICATION_SUCCESS";
/// Sentinel prefix for a failed verification.
const VERIFY_FAILED_PREFIX: &str = "VERIFICATION_FAILED:";

/// Poll interval while waiting for driver exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Interpreter-process artifact backend.
///
/// # Invariants
/// - Every invocation is a fresh subprocess; the wall-clock cap delivers a
///   hard kill, never a cooperative cancel.
#[derive(Debug, Clone)]
pub struct InterpreterBackend {
    /// Interpreter executable invoked per call.
    interpreter: String,
}

impl InterpreterBackend {
    /// Builds a backend using the `python3` interpreter on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interpreter: "python3".to_string(),
        }
    }

    /// Builds a backend with an explicit interpreter executable.
    #[must_use]
    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Runs a driver subprocess under the wall-clock cap.
    ///
    /// Both output pipes are drained on reader threads while the poll loop
    /// waits, so a driver whose result exceeds the OS pipe buffer never
    /// blocks on write and gets misreported as a timeout.
    fn run_driver(
        &self,
        driver: &str,
        artifact_dir: &Path,
        stdin_payload: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<DriverOutput, BackendError> {
        let started = Instant::now();
        let mut child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(driver)
            .arg(artifact_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| BackendError::Spawn(err.to_string()))?;

        if let Some(payload) = stdin_payload
            && let Some(mut stdin) = child.stdin.take()
        {
            // A fast-exiting driver may close stdin first; that is its
            // failure to report, not ours.
            let _ = stdin.write_all(payload);
        } else {
            drop(child.stdin.take());
        }

        let stdout_reader = spawn_stream_reader(child.stdout.take());
        let stderr_reader = spawn_stream_reader(child.stderr.take());

        let deadline = started + timeout;
        let mut timed_out = false;
        let exit = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status.code(),
                Ok(None) => {}
                Err(err) => return Err(BackendError::Spawn(err.to_string())),
            }
            if Instant::now() >= deadline {
                timed_out = true;
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(DriverOutput {
            stdout: join_stream_reader(stdout_reader),
            stderr: join_stream_reader(stderr_reader),
            exit,
            timed_out,
            duration_ms: elapsed_ms(started),
        })
    }
}

impl Default for InterpreterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactBackend for InterpreterBackend {
    fn probe(&self, artifact_dir: &Path) -> Result<ArtifactSymbols, BackendError> {
        let skill_file = artifact_dir.join("skill.py");
        if !skill_file.is_file() {
            return Err(BackendError::MissingArtifact(skill_file));
        }
        let output =
            self.run_driver(PROBE_DRIVER, artifact_dir, None, Duration::from_secs(30))?;
        if let Some(report) = last_line_with_prefix(&output.stdout, PROBE_RESULT_PREFIX) {
            return parse_probe_report(&report);
        }
        let detail = last_line_with_prefix(&output.stdout, PROBE_ERROR_PREFIX)
            .unwrap_or_else(|| format!("probe produced no report: {}", output.stderr.trim()));
        Err(BackendError::Protocol(detail))
    }

    fn invoke_action(
        &self,
        artifact_dir: &Path,
        input: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<ActionOutcome, BackendError> {
        let skill_file = artifact_dir.join("skill.py");
        if !skill_file.is_file() {
            return Ok(ActionOutcome {
                value: None,
                error: Some(format!("Skill file not found: {}", skill_file.display())),
                timed_out: false,
                duration_ms: 0,
            });
        }

        let payload = serde_json::to_vec(&Value::Object(input.clone()))
            .map_err(|err| BackendError::Protocol(err.to_string()))?;
        let output = self.run_driver(ACTION_DRIVER, artifact_dir, Some(&payload), timeout)?;

        if output.timed_out {
            return Ok(ActionOutcome {
                value: None,
                error: Some("timeout".to_string()),
                timed_out: true,
                duration_ms: output.duration_ms,
            });
        }

        if let Some(encoded) = last_line_with_prefix(&output.stdout, ACTION_RESULT_PREFIX) {
            let value: Value = serde_json::from_str(&encoded)
                .map_err(|err| BackendError::Protocol(format!("unparsable result: {err}")))?;
            return Ok(ActionOutcome {
                value: Some(value),
                error: None,
                timed_out: false,
                duration_ms: output.duration_ms,
            });
        }

        let error = last_line_with_prefix(&output.stdout, ACTION_ERROR_PREFIX).unwrap_or_else(
            || {
                format!(
                    "action driver exited without a result (exit {:?}): {}",
                    output.exit,
                    output.stderr.trim()
                )
            },
        );
        Ok(ActionOutcome {
            value: None,
            error: Some(error),
            timed_out: false,
            duration_ms: output.duration_ms,
        })
    }

    fn invoke_verify(
        &self,
        artifact_dir: &Path,
        timeout: Duration,
    ) -> Result<VerifyOutcome, BackendError> {
        let skill_file = artifact_dir.join("skill.py");
        if !skill_file.is_file() {
            return Ok(VerifyOutcome {
                passed: false,
                detail: format!("Skill file not found: {}", skill_file.display()),
            });
        }

        let output = self.run_driver(HARNESS_SOURCE, artifact_dir, None, timeout)?;
        if output.timed_out {
            return Ok(VerifyOutcome {
                passed: false,
                detail: "timeout".to_string(),
            });
        }

        let passed =
            output.exit == Some(0) && output.stdout.contains(VERIFY_SUCCESS_SENTINEL);
        let detail = if passed {
            VERIFY_SUCCESS_SENTINEL.to_string()
        } else {
            output
                .stdout
                .lines()
                .find(|line| line.starts_with(VERIFY_FAILED_PREFIX))
                .map_or_else(|| output.stderr.trim().to_string(), ToString::to_string)
        };
        Ok(VerifyOutcome {
            passed,
            detail,
        })
    }
}

// ============================================================================
// SECTION: Driver Output
// ============================================================================

/// Captured output of one driver subprocess.
#[derive(Debug)]
struct DriverOutput {
    /// Captured stdout text.
    stdout: String,
    /// Captured stderr text.
    stderr: String,
    /// Exit code, when the process exited normally.
    exit: Option<i32>,
    /// Set when the wall-clock cap killed the process.
    timed_out: bool,
    /// Invocation duration in milliseconds.
    duration_ms: u64,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Starts a thread draining a captured stream to completion.
///
/// Draining runs concurrently with the wait loop so the child never blocks
/// on a full pipe.
fn spawn_stream_reader<R: Read + Send + 'static>(
    stream: Option<R>,
) -> Option<thread::JoinHandle<Vec<u8>>> {
    stream.map(|mut stream| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = stream.read_to_end(&mut buffer);
            buffer
        })
    })
}

/// Collects a drained stream as a lossy string.
fn join_stream_reader(reader: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    let bytes = reader.map_or_else(Vec::new, |handle| handle.join().unwrap_or_default());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Returns the remainder of the last stdout line carrying the prefix.
fn last_line_with_prefix(stdout: &str, prefix: &str) -> Option<String> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(prefix).map(ToString::to_string))
}

/// Parses a `action=<bool> verify=<bool>` probe report.
fn parse_probe_report(report: &str) -> Result<ArtifactSymbols, BackendError> {
    let mut has_action = false;
    let mut has_verify = false;
    for pair in report.split_whitespace() {
        match pair {
            "action=true" => has_action = true,
            "verify=true" => has_verify = true,
            "action=false" | "verify=false" => {}
            other => {
                return Err(BackendError::Protocol(format!("unexpected probe field: {other}")));
            }
        }
    }
    Ok(ArtifactSymbols {
        has_action,
        has_verify,
    })
}

/// Milliseconds elapsed since `started`, saturating.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
