// crates/skill-gate-sandbox/src/lib.rs
// ============================================================================
// Module: Skill Gate Sandbox
// Description: Container-isolated execution harness and interpreter backend.
// Purpose: Run untrusted artifacts under hostile assumptions and report decisions.
// Dependencies: serde, serde_json, skill-gate-core, thiserror
// ============================================================================

//! ## Overview
//! Two isolation surfaces live here. The [`SandboxRunner`] drives a
//! single-shot, resource-capped, network-denied container run of the
//! artifact's self-test and decides from the exit code plus the printed
//! sentinel. The [`InterpreterBackend`] executes artifact entry points in
//! short-lived interpreter subprocesses with a wall-clock cap enforced at
//! the process boundary; the eval gate and the prod loader both invoke
//! artifacts through it.
//!
//! Security posture: artifacts are hostile. Both conditions of the runner's
//! decision rule are required, so neither a clean exit without the sentinel
//! nor a sentinel followed by a crash can pass.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backend;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::InterpreterBackend;
pub use runner::HARNESS_SOURCE;
pub use runner::SandboxConfig;
pub use runner::SandboxConfigError;
pub use runner::SandboxRunner;
pub use runner::decide;
