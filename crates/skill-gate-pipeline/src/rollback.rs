// crates/skill-gate-pipeline/src/rollback.rs
// ============================================================================
// Module: Skill Rollbacker
// Description: Restore a previously-promoted version to prod.
// Purpose: Re-promote a rollback-eligible version with a full audit trail.
// Dependencies: skill-gate-{core,registry}, thiserror
// ============================================================================

//! ## Overview
//! Rollback fails loudly on bad preconditions (unknown skill, unknown
//! version, never-promoted target) before any mutation and without any
//! audit output. On success, a differing outgoing prod is disabled with
//! reason `Rollback to <target>` and audited as `DISABLE`, then the
//! `ROLLBACK` event records the transition with `from` and `to`. The
//! registry save precedes both events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use skill_gate_core::SkillName;
use skill_gate_core::VersionId;
use skill_gate_registry::AuditError;
use skill_gate_registry::AuditEvent;
use skill_gate_registry::AuditLogger;
use skill_gate_registry::AuditOperation;
use skill_gate_registry::Registry;
use skill_gate_registry::RegistryError;
use skill_gate_registry::RollbackOutcome;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rollback errors.
#[derive(Debug, Error)]
pub enum RollbackError {
    /// Precondition or persistence failure in the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Audit append failed after the registry was updated.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

// ============================================================================
// SECTION: Rollback
// ============================================================================

/// Rolls a skill back to a previously-promoted version.
///
/// # Errors
///
/// Returns [`RollbackError::Registry`] with a typed precondition failure
/// (unknown skill, unknown version, never-promoted target) before any
/// mutation, or a persistence/audit error afterwards.
pub fn rollback_skill(
    registry: &Registry,
    audit: &AuditLogger,
    skill_name: &SkillName,
    target_version: &VersionId,
) -> Result<RollbackOutcome, RollbackError> {
    let outcome = registry.rollback(skill_name, target_version)?;

    if let Some(disabled) = &outcome.disabled {
        audit.append(
            &AuditEvent::new(AuditOperation::Disable)
                .field("skill", skill_name)
                .field("version", disabled)
                .field("reason", format!("Rollback to {target_version}")),
        )?;
    }

    let from = outcome.from.as_ref().map_or_else(|| "none".to_string(), ToString::to_string);
    audit.append(
        &AuditEvent::new(AuditOperation::Rollback)
            .field("skill", skill_name)
            .field("from", from)
            .field("to", target_version),
    )?;

    Ok(outcome)
}
