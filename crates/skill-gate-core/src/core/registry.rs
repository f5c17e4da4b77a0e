// crates/skill-gate-core/src/core/registry.rs
// ============================================================================
// Module: Versioned Registry Model
// Description: Skill entries, version records, statuses, and gate outcomes.
// Purpose: Model the rollback-safe ledger of every skill version transition.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! The registry is the durable system of record. Each skill owns a version
//! map plus `current_prod` / `current_staging` pointers. A version is created
//! in `staging`, promoted at most once to `prod`, demoted to `disabled`, and
//! may return to `prod` only through rollback. At most one version per skill
//! holds each pointer state at a time.
//!
//! Security posture: registry files on disk are untrusted on load; stores
//! must fail closed on corruption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::SkillName;
use crate::core::identifiers::VersionId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Version Status
// ============================================================================

/// Skill version lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - At most one version per skill is `Prod`; at most one is `Staging`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// Validated but not yet promoted.
    Staging,
    /// Serving production traffic.
    Prod,
    /// Demoted; eligible for rollback only if previously promoted.
    Disabled,
}

// ============================================================================
// SECTION: Gate Categories
// ============================================================================

/// Evaluation gate categories used by the promoter.
///
/// # Invariants
/// - Variants are stable for serialization and audit rendering.
/// - `standard_threshold` values are the promotion contract: a single failure
///   in a 1.0-threshold gate is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateCategory {
    /// Verify the skill still solves its originating problem.
    Replay,
    /// Ensure historical capability does not degrade.
    Regression,
    /// Adversarial security cases.
    Redteam,
}

impl GateCategory {
    /// All categories in promoter execution order.
    pub const ALL: [Self; 3] = [Self::Replay, Self::Regression, Self::Redteam];

    /// Returns the stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replay => "replay",
            Self::Regression => "regression",
            Self::Redteam => "redteam",
        }
    }

    /// Returns the standard promotion threshold for this category.
    #[must_use]
    pub const fn standard_threshold(self) -> f64 {
        match self {
            Self::Replay | Self::Redteam => 1.0,
            Self::Regression => 0.99,
        }
    }
}

impl fmt::Display for GateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate category parse errors.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown gate category: {0}")]
pub struct GateCategoryError(String);

impl FromStr for GateCategory {
    type Err = GateCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replay" => Ok(Self::Replay),
            "regression" => Ok(Self::Regression),
            "redteam" => Ok(Self::Redteam),
            other => Err(GateCategoryError(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Validation Records
// ============================================================================

/// Static gate outcome stored under a version's validation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstGateRecord {
    /// Whether the gate passed.
    pub passed: bool,
    /// Accumulated violation descriptions.
    pub violations: Vec<String>,
}

/// Sandbox outcome stored under a version's validation record.
///
/// # Invariants
/// - A skipped run has `skipped == Some(true)` and no `passed` verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SandboxRecord {
    /// Whether the sandbox run passed; absent when skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    /// Set when the sandbox was unavailable or globally skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    /// Run metrics captured by the runner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
}

/// Per-category evaluation gate statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcomeRecord {
    /// Total cases executed.
    pub total: usize,
    /// Cases that passed.
    pub passed: usize,
    /// Cases that failed.
    pub failed: usize,
    /// Pass rate in `0.0..=1.0` (vacuously `1.0` for zero cases).
    pub pass_rate: f64,
    /// Threshold the gate was held to.
    pub threshold: f64,
    /// Whether `pass_rate >= threshold`.
    pub gate_passed: bool,
}

/// Structured results of every gate a version has been through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValidationRecord {
    /// Static gate outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast_gate: Option<AstGateRecord>,
    /// Sandbox outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<SandboxRecord>,
    /// Promotion gate outcomes keyed by category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_gate: Option<BTreeMap<String, GateOutcomeRecord>>,
}

// ============================================================================
// SECTION: Skill Version
// ============================================================================

/// A single version of a skill in the ledger.
///
/// # Invariants
/// - `created_at <= promoted_at <= disabled_at` when defined.
/// - Only versions with a non-null `promoted_at` are rollback targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillVersion {
    /// Version identifier.
    pub version: VersionId,
    /// SHA-256 hex of the skill code bytes.
    pub code_hash: String,
    /// SHA-256 hex of the canonical JSON manifest encoding.
    pub manifest_hash: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Lifecycle status.
    pub status: VersionStatus,
    /// Gate results recorded for this version.
    #[serde(default)]
    pub validation: ValidationRecord,
    /// Promotion timestamp; null until first promoted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<Timestamp>,
    /// Demotion timestamp; null until disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_at: Option<Timestamp>,
    /// Reason recorded at demotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
}

// ============================================================================
// SECTION: Skill Entry
// ============================================================================

/// Registry entry for one skill across all its versions.
///
/// # Invariants
/// - `current_prod` / `current_staging` point at versions present in
///   `versions` with the matching status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Skill name.
    pub name: SkillName,
    /// Version currently serving production, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_prod: Option<VersionId>,
    /// Version currently staged, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_staging: Option<VersionId>,
    /// All known versions keyed by version string.
    #[serde(default)]
    pub versions: BTreeMap<String, SkillVersion>,
}

impl SkillEntry {
    /// Creates an empty entry for a skill.
    #[must_use]
    pub const fn new(name: SkillName) -> Self {
        Self {
            name,
            current_prod: None,
            current_staging: None,
            versions: BTreeMap::new(),
        }
    }
}

// ============================================================================
// SECTION: Registry Root
// ============================================================================

/// Root registry document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryData {
    /// Skill entries keyed by skill name.
    pub skills: BTreeMap<String, SkillEntry>,
    /// Last-save timestamp.
    pub updated_at: Timestamp,
}

impl RegistryData {
    /// Creates an empty registry stamped with the given time.
    #[must_use]
    pub const fn empty(updated_at: Timestamp) -> Self {
        Self {
            skills: BTreeMap::new(),
            updated_at,
        }
    }
}
