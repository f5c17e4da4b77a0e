// crates/skill-gate-eval/src/lib.rs
// ============================================================================
// Module: Skill Gate Evaluation
// Description: Acceptance gate executor with matchers and per-case timeouts.
// Purpose: Decide promotion eligibility from replay/regression/redteam suites.
// Dependencies: serde, serde_jcs, serde_json, skill-gate-core, thiserror
// ============================================================================

//! ## Overview
//! The evaluation gate discovers JSON case files for a category, filters
//! them to the skill under test, executes each case through an
//! [`skill_gate_core::ArtifactBackend`] with a hard per-case timeout, and
//! scores the run against a pass-rate threshold. An empty case set passes
//! vacuously. Case-level faults (missing source, missing entry point,
//! raised errors) fail the case, never the gate run itself.
//!
//! Security posture: case outputs come from untrusted artifacts; matchers
//! fail closed on unknown expectation kinds.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cases;
pub mod gate;
pub mod matchers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cases::EvalCase;
pub use cases::EvalError;
pub use cases::load_cases;
pub use gate::EvalGate;
pub use gate::EvalResult;
pub use gate::GateReport;
pub use matchers::evaluate_expected;
pub use matchers::stringify_value;
