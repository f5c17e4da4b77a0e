// crates/skill-gate-policy/src/lib.rs
// ============================================================================
// Module: Skill Gate Static Policy
// Description: Deny-by-default static analyzer for generated skill source.
// Purpose: Reject unsafe imports, calls, attributes, and textual patterns before execution.
// Dependencies: regex, serde, serde_json, thiserror, tree-sitter, tree-sitter-python
// ============================================================================

//! ## Overview
//! The static gate decides deny/allow on a code string without executing it.
//! Three phases run in order: a textual scan for suspicious patterns, a
//! structural parse, and a tree walk over imports, calls, and attribute
//! accesses. The phases catch three independent classes: string-level
//! intent, syntactic malformation, and structural capability. Policy is
//! data, not code: the tables ship with compiled-in defaults and can be
//! loaded from a JSON artifact.
//!
//! Security posture: analyzed source is hostile; ambiguity is a rejection.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod gate;
pub mod tables;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use gate::GateResult;
pub use gate::StaticGate;
pub use tables::PolicyError;
pub use tables::PolicyTables;

#[cfg(test)]
mod tests;
