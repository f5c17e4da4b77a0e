// crates/skill-gate-sandbox/src/runner.rs
// ============================================================================
// Module: Container Sandbox Runner
// Description: Single-shot Docker run of the artifact self-test harness.
// Purpose: Decide verification under network denial and resource caps.
// Dependencies: skill-gate-core, std::process (docker CLI), thiserror
// ============================================================================

//! ## Overview
//! Each run starts a fresh detached container with the non-negotiable
//! isolation flags (no network, read-only root, all capabilities dropped,
//! no-new-privileges, memory/pids/cpu caps, noexec scratch tmpfs), polls for
//! exit under the wall-clock cap, captures logs, and always kills and
//! removes the container afterwards. The decision requires both a zero exit
//! code and the `VERIFICATION_SUCCESS` sentinel in the captured logs.
//!
//! Security posture: the container contents are hostile; only the observable
//! exit code and output participate in the decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::process::Command;
use std::process::Output;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use skill_gate_core::RunMetrics;
use skill_gate_core::SandboxDecision;
use skill_gate_core::SandboxExecutor;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Harness source installed into the sandbox image at `/sandbox/harness.py`.
pub const HARNESS_SOURCE: &str = include_str!("../assets/harness.py");

/// Sentinel line printed by the harness on strict success.
const SUCCESS_SENTINEL: &str = "VERIFICATION_SUCCESS";

/// Poll interval while waiting for container exit.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Sandbox runner configuration.
///
/// # Invariants
/// - A non-`none` network mode requires `allow_network == true`; default
///   construction refuses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Sandbox image name.
    pub image: String,
    /// Wall-clock cap for one run.
    pub timeout: Duration,
    /// Docker network mode.
    pub network_mode: String,
    /// Explicit opt-in for non-`none` network modes.
    pub allow_network: bool,
    /// Memory cap (also applied as the swap cap).
    pub memory_limit: String,
    /// Process count cap.
    pub pids_limit: u32,
    /// CPU scheduler period in microseconds.
    pub cpu_period: u32,
    /// CPU quota in microseconds per period (one core equivalent).
    pub cpu_quota: u32,
    /// Scratch tmpfs mount options for `/tmp`.
    pub tmpfs_options: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: "skill-gate-sandbox:latest".to_string(),
            timeout: Duration::from_secs(30),
            network_mode: "none".to_string(),
            allow_network: false,
            memory_limit: "512m".to_string(),
            pids_limit: 128,
            cpu_period: 100_000,
            cpu_quota: 100_000,
            tmpfs_options: "size=64m,noexec".to_string(),
        }
    }
}

/// Sandbox configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SandboxConfigError {
    /// A non-`none` network mode was requested without the explicit opt-in.
    #[error("network mode {0:?} requires allow_network=true")]
    NetworkOptInRequired(String),
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Docker-backed sandbox runner.
///
/// # Invariants
/// - Construction enforces the network opt-in rule; a constructed runner
///   never launches with a network unless explicitly allowed.
#[derive(Debug, Clone)]
pub struct SandboxRunner {
    /// Validated configuration.
    config: SandboxConfig,
}

impl SandboxRunner {
    /// Builds a runner, enforcing the network opt-in invariant.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxConfigError::NetworkOptInRequired`] when the config
    /// selects a non-`none` network mode without `allow_network`.
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxConfigError> {
        if config.network_mode != "none" && !config.allow_network {
            return Err(SandboxConfigError::NetworkOptInRequired(config.network_mode));
        }
        Ok(Self {
            config,
        })
    }

    /// Builds a runner with the default locked-down configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            config: SandboxConfig::default(),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Runs the harness with an optional read-write `/output` mount.
    #[must_use]
    pub fn run_with_output(&self, artifact_dir: &Path, output_dir: Option<&Path>) -> SandboxDecision {
        let started = Instant::now();
        match self.launch(artifact_dir, output_dir) {
            Ok(container_id) => self.await_decision(&container_id, started),
            Err(detail) => failed_decision(detail, started),
        }
    }

    /// Starts the detached container and returns its identifier.
    fn launch(&self, artifact_dir: &Path, output_dir: Option<&Path>) -> Result<String, String> {
        let artifact_abs = std::fs::canonicalize(artifact_dir)
            .map_err(|err| format!("artifact directory unavailable: {err}"))?;

        let mut command = Command::new("docker");
        command
            .arg("run")
            .arg("-d")
            .args(["--network", &self.config.network_mode])
            .arg("--read-only")
            .args(["--memory", &self.config.memory_limit])
            .args(["--memory-swap", &self.config.memory_limit])
            .args(["--cpu-period", &self.config.cpu_period.to_string()])
            .args(["--cpu-quota", &self.config.cpu_quota.to_string()])
            .args(["--pids-limit", &self.config.pids_limit.to_string()])
            .args(["--cap-drop", "ALL"])
            .args(["--security-opt", "no-new-privileges:true"])
            .args(["--tmpfs", &format!("/tmp:{}", self.config.tmpfs_options)])
            .args(["-v", &format!("{}:/skill:ro", artifact_abs.display())]);

        if let Some(output) = output_dir {
            std::fs::create_dir_all(output)
                .map_err(|err| format!("output directory unavailable: {err}"))?;
            let output_abs = std::fs::canonicalize(output)
                .map_err(|err| format!("output directory unavailable: {err}"))?;
            command.args(["-v", &format!("{}:/output:rw", output_abs.display())]);
        }

        command.arg(&self.config.image).args(["python", "/sandbox/harness.py", "/skill"]);

        let output =
            command.output().map_err(|err| format!("docker run failed to spawn: {err}"))?;
        if !output.status.success() {
            return Err(format!(
                "docker run failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Waits for exit under the wall-clock cap, gathers logs, cleans up.
    fn await_decision(&self, container_id: &str, started: Instant) -> SandboxDecision {
        let deadline = started + self.config.timeout;
        let mut exit_code: Option<i64> = None;
        let mut timed_out = false;

        loop {
            match inspect_state(container_id) {
                Ok(Some(code)) => {
                    exit_code = Some(code);
                    break;
                }
                Ok(None) => {}
                Err(_) => break,
            }
            if Instant::now() >= deadline {
                timed_out = true;
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        let logs = container_logs(container_id);
        let cleanup = cleanup_container(container_id);

        let mut metrics = RunMetrics {
            exit_code,
            duration_ms: elapsed_ms(started),
            timeout: timed_out,
            error: None,
            cleanup,
        };

        let passed = !timed_out && decide(exit_code, &logs);
        if timed_out {
            metrics.error = Some("wall-clock timeout expired".to_string());
        }

        SandboxDecision {
            passed,
            logs,
            metrics,
        }
    }
}

impl SandboxExecutor for SandboxRunner {
    fn is_available(&self) -> bool {
        let daemon = docker_quiet(&["info"]);
        let image = docker_quiet(&["image", "inspect", &self.config.image]);
        daemon && image
    }

    fn run(&self, artifact_dir: &Path) -> SandboxDecision {
        self.run_with_output(artifact_dir, None)
    }
}

// ============================================================================
// SECTION: Decision Rule
// ============================================================================

/// The runner decision rule: both a zero exit code and the sentinel are
/// required.
#[must_use]
pub fn decide(exit_code: Option<i64>, logs: &str) -> bool {
    exit_code == Some(0) && logs.contains(SUCCESS_SENTINEL)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs a docker subcommand, reporting only success.
fn docker_quiet(args: &[&str]) -> bool {
    Command::new("docker").args(args).output().is_ok_and(|output| output.status.success())
}

/// Runs a docker subcommand and returns its output.
fn docker_output(args: &[&str]) -> Result<Output, String> {
    Command::new("docker")
        .args(args)
        .output()
        .map_err(|err| format!("docker {} failed: {err}", args.first().unwrap_or(&"")))
}

/// Inspects container state; `Ok(Some(code))` once the container exited.
fn inspect_state(container_id: &str) -> Result<Option<i64>, String> {
    let output = docker_output(&[
        "inspect",
        "-f",
        "{{.State.Running}};{{.State.ExitCode}}",
        container_id,
    ])?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let mut parts = text.trim().split(';');
    let running = parts.next().unwrap_or("true");
    let code = parts.next().and_then(|raw| raw.parse::<i64>().ok());
    if running == "false" {
        return Ok(Some(code.unwrap_or(1)));
    }
    Ok(None)
}

/// Captures container stdout and stderr.
fn container_logs(container_id: &str) -> String {
    docker_output(&["logs", container_id]).map_or_else(
        |_| String::new(),
        |output| {
            let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
            logs.push_str(&String::from_utf8_lossy(&output.stderr));
            logs
        },
    )
}

/// Kills and removes the container; failures are recorded, never fatal.
///
/// The kill is best-effort (it fails routinely on already-exited
/// containers); only a failed remove is worth reporting.
fn cleanup_container(container_id: &str) -> Option<String> {
    let _ = docker_quiet(&["kill", container_id]);
    if docker_quiet(&["rm", "-f", container_id]) {
        None
    } else {
        Some("container remove failed".to_string())
    }
}

/// Builds a failed decision for a launch-stage error.
fn failed_decision(detail: String, started: Instant) -> SandboxDecision {
    SandboxDecision {
        passed: false,
        logs: detail.clone(),
        metrics: RunMetrics {
            exit_code: None,
            duration_ms: elapsed_ms(started),
            timeout: false,
            error: Some(detail),
            cleanup: None,
        },
    }
}

/// Milliseconds elapsed since `started`, saturating.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
