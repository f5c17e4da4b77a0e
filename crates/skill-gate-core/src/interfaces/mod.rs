// crates/skill-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Skill Gate Interfaces
// Description: Backend-agnostic interfaces for generation, sandboxing, and artifacts.
// Purpose: Define the contract surfaces the pipeline orchestrates over.
// Dependencies: crate::core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the pipeline integrates with its collaborators
//! without embedding backend details: the code generator, the isolation
//! sandbox, and the artifact execution backend. Implementations must be
//! deterministic with respect to their inputs and fail closed on missing or
//! invalid data; tests substitute stubs at these seams.
//!
//! Security posture: everything crossing these interfaces is untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::SkillName;

// ============================================================================
// SECTION: Skill Generator
// ============================================================================

/// Artifact package produced by a generator.
///
/// # Invariants
/// - `manifest` is raw generator output; it has not passed validation yet.
/// - `tests` are optional acceptance cases carried for eval seeding; they are
///   not written to staging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillPackage {
    /// Skill name token.
    pub name: SkillName,
    /// Skill source text.
    pub code: String,
    /// Structured manifest declaration.
    pub manifest: Value,
    /// Optional acceptance cases.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<Value>,
}

/// Generator errors.
///
/// # Invariants
/// - `UnknownCapability` is an expected per-item failure; anything else is
///   unexpected and still only fails the single item.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The generator has no skill for the requested capability.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
    /// The generator backend reported an error.
    #[error("generator error: {0}")]
    Provider(String),
}

/// Pluggable capability-to-artifact producer.
pub trait SkillGenerator {
    /// Generates a skill package for a capability description.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UnknownCapability`] when no skill can be
    /// produced for the capability, or [`GenerateError::Provider`] for
    /// backend failures.
    fn generate_skill(&self, capability: &str, context: &str)
    -> Result<SkillPackage, GenerateError>;
}

// ============================================================================
// SECTION: Sandbox Executor
// ============================================================================

/// Metrics captured for one sandbox run.
///
/// # Invariants
/// - `timeout == true` implies `passed == false` in the enclosing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunMetrics {
    /// Container exit code, when the container exited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
    /// Set when the wall-clock cap expired.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timeout: bool,
    /// Runner-level error detail, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Cleanup failure detail; recorded, never decision-affecting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<String>,
}

/// Decision produced by one sandbox run.
///
/// # Invariants
/// - `passed` requires both a zero exit code and the success sentinel in
///   `logs`; every other combination is a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxDecision {
    /// Whether verification passed.
    pub passed: bool,
    /// Captured container stdout and stderr.
    pub logs: String,
    /// Run metrics.
    pub metrics: RunMetrics,
}

/// Isolated execution harness for artifact self-tests.
pub trait SandboxExecutor {
    /// Returns true when the isolation backend is ready to run.
    fn is_available(&self) -> bool;

    /// Runs the artifact's self-test under isolation.
    ///
    /// Failures of any kind (timeout, runtime error, missing sentinel) are
    /// expressed in the decision, never as a panic or early return.
    fn run(&self, artifact_dir: &Path) -> SandboxDecision;
}

// ============================================================================
// SECTION: Artifact Backend
// ============================================================================

/// Entry points an artifact exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSymbols {
    /// Whether the artifact defines `action`.
    pub has_action: bool,
    /// Whether the artifact defines `verify`.
    pub has_verify: bool,
}

/// Outcome of one `action` invocation.
///
/// # Invariants
/// - Exactly one of `value` / `error` is populated unless the invocation
///   timed out, in which case `error` is `"timeout"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Returned value, when the invocation completed.
    pub value: Option<Value>,
    /// Error description, when the invocation failed.
    pub error: Option<String>,
    /// Set when the wall-clock timeout expired.
    pub timed_out: bool,
    /// Invocation duration in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of one `verify` invocation.
///
/// # Invariants
/// - `passed` is true only for an exact boolean `true` return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    /// Whether verification passed strictly.
    pub passed: bool,
    /// Diagnostic detail for failures.
    pub detail: String,
}

/// Artifact backend errors.
///
/// # Invariants
/// - Variants describe backend infrastructure failures; in-artifact failures
///   are expressed inside [`ActionOutcome`] / [`VerifyOutcome`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// The artifact source file is missing.
    #[error("artifact source not found under {0}")]
    MissingArtifact(std::path::PathBuf),
    /// The backend process could not be spawned.
    #[error("backend spawn failed: {0}")]
    Spawn(String),
    /// The backend produced output outside its line protocol.
    #[error("backend protocol violation: {0}")]
    Protocol(String),
}

/// Pluggable artifact execution backend.
///
/// Backends load an artifact from a directory and expose its `action` and
/// `verify` entry points. Interpreted-artifact backends shell out to an
/// interpreter process per invocation; natively-compiled backends may load a
/// shared object. The pipeline does not care which is in use.
pub trait ArtifactBackend {
    /// Reports which entry points the artifact exposes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the artifact cannot be inspected at all.
    fn probe(&self, artifact_dir: &Path) -> Result<ArtifactSymbols, BackendError>;

    /// Invokes `action` with named arguments under a wall-clock timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] only for backend infrastructure failures;
    /// in-artifact errors and timeouts are reported in the outcome.
    fn invoke_action(
        &self,
        artifact_dir: &Path,
        input: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<ActionOutcome, BackendError>;

    /// Invokes `verify` under a wall-clock timeout with the strict-`true`
    /// pass rule.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] only for backend infrastructure failures.
    fn invoke_verify(
        &self,
        artifact_dir: &Path,
        timeout: Duration,
    ) -> Result<VerifyOutcome, BackendError>;
}
