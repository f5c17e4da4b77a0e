// crates/skill-gate-eval/src/gate.rs
// ============================================================================
// Module: Evaluation Gate Executor
// Description: Sequential case execution with per-case timeouts and scoring.
// Purpose: Produce a gate report with pass rate against a threshold.
// Dependencies: crate::{cases, matchers}, serde, skill-gate-core
// ============================================================================

//! ## Overview
//! One gate run executes every discovered case sequentially through the
//! artifact backend. The per-case timeout is enforced at the process
//! boundary by the backend, so a wedged artifact is interrupted, not merely
//! detected after the fact. Backend infrastructure failures fail the
//! affected case with an explanatory error; only unreadable case data fails
//! the gate run itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use skill_gate_core::ArtifactBackend;
use skill_gate_core::GateCategory;
use skill_gate_core::GateOutcomeRecord;

use crate::cases::EvalCase;
use crate::cases::EvalError;
use crate::cases::load_cases;
use crate::matchers::evaluate_expected;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Result of one executed case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Case identifier.
    pub case_id: String,
    /// Whether the case passed its matcher.
    pub passed: bool,
    /// Value returned by the action, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<Value>,
    /// Error raised during the invocation, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Invocation duration in milliseconds.
    pub duration_ms: u64,
}

/// Report from one gate run.
///
/// # Invariants
/// - `pass_rate == passed_count / total` when `total > 0`; an empty case
///   set passes vacuously with `pass_rate == 1.0`.
/// - `gate_passed == (pass_rate >= threshold)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    /// Gate category executed.
    pub gate: GateCategory,
    /// Total cases executed.
    pub total: usize,
    /// Cases that passed.
    pub passed_count: usize,
    /// Cases that failed.
    pub failed_count: usize,
    /// Pass rate in `0.0..=1.0`.
    pub pass_rate: f64,
    /// Threshold the gate was held to.
    pub threshold: f64,
    /// Whether the gate passed.
    pub gate_passed: bool,
    /// Per-case results in execution order.
    pub results: Vec<EvalResult>,
}

impl GateReport {
    /// Converts the report into the registry's validation record shape.
    #[must_use]
    pub const fn to_outcome_record(&self) -> GateOutcomeRecord {
        GateOutcomeRecord {
            total: self.total,
            passed: self.passed_count,
            failed: self.failed_count,
            pass_rate: self.pass_rate,
            threshold: self.threshold,
            gate_passed: self.gate_passed,
        }
    }
}

// ============================================================================
// SECTION: Gate Executor
// ============================================================================

/// Evaluation gate executor over a case data directory.
pub struct EvalGate {
    /// Root of the evaluation data tree.
    eval_dir: PathBuf,
    /// Backend used to invoke artifacts.
    backend: Arc<dyn ArtifactBackend>,
}

impl EvalGate {
    /// Builds a gate executor.
    #[must_use]
    pub fn new(eval_dir: impl Into<PathBuf>, backend: Arc<dyn ArtifactBackend>) -> Self {
        Self {
            eval_dir: eval_dir.into(),
            backend,
        }
    }

    /// Executes a single case against the artifact directory.
    #[must_use]
    pub fn run_case(&self, case: &EvalCase, artifact_dir: &Path) -> EvalResult {
        let timeout = Duration::from_millis(case.timeout_ms);
        match self.backend.invoke_action(artifact_dir, &case.input, timeout) {
            Ok(outcome) => {
                let passed = evaluate_expected(
                    outcome.value.as_ref(),
                    &case.expected,
                    outcome.error.as_deref(),
                    outcome.duration_ms,
                );
                EvalResult {
                    case_id: case.id.clone(),
                    passed,
                    actual_output: outcome.value,
                    error: outcome.error,
                    duration_ms: outcome.duration_ms,
                }
            }
            Err(err) => EvalResult {
                case_id: case.id.clone(),
                passed: false,
                actual_output: None,
                error: Some(err.to_string()),
                duration_ms: 0,
            },
        }
    }

    /// Runs every case of a category against a skill artifact.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when case data exists but cannot be loaded.
    pub fn run_gate(
        &self,
        category: GateCategory,
        skill_name: &str,
        artifact_dir: &Path,
        threshold: f64,
    ) -> Result<GateReport, EvalError> {
        let cases = load_cases(&self.eval_dir, category.as_str(), skill_name)?;

        let mut results = Vec::with_capacity(cases.len());
        for case in &cases {
            results.push(self.run_case(case, artifact_dir));
        }

        let total = results.len();
        let passed_count = results.iter().filter(|r| r.passed).count();
        let failed_count = total - passed_count;
        let pass_rate = if total > 0 {
            passed_count as f64 / total as f64
        } else {
            // Vacuous pass for an empty case set.
            1.0
        };
        let gate_passed = pass_rate >= threshold;

        Ok(GateReport {
            gate: category,
            total,
            passed_count,
            failed_count,
            pass_rate,
            threshold,
            gate_passed,
            results,
        })
    }
}
