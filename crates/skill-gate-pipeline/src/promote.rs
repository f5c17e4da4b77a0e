// crates/skill-gate-pipeline/src/promote.rs
// ============================================================================
// Module: Skill Promoter
// Description: Three-gate evaluation and atomic staging-to-prod promotion.
// Purpose: Promote only artifacts that clear replay, regression, and redteam.
// Dependencies: crate, skill-gate-{core,eval,registry}, thiserror
// ============================================================================

//! ## Overview
//! Promotion runs the evaluation gates in order (replay, regression,
//! redteam) against the staging artifact, records the combined outcome
//! under the version's validation record, and only then copies the artifact
//! tree into prod and flips the registry pointers. The copy lands in a
//! sibling temp directory first and is renamed into place, so a failed copy
//! never leaves the registry claiming a prod tree that does not exist.
//! A failed gate leaves the staging pointer and prod tree untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use skill_gate_core::ArtifactBackend;
use skill_gate_core::GateCategory;
use skill_gate_core::SkillName;
use skill_gate_eval::EvalError;
use skill_gate_eval::EvalGate;
use skill_gate_eval::GateReport;
use skill_gate_registry::AuditError;
use skill_gate_registry::AuditEvent;
use skill_gate_registry::AuditLogger;
use skill_gate_registry::AuditOperation;
use skill_gate_registry::Registry;
use skill_gate_registry::RegistryError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Promotion errors for absent prerequisites and infrastructure faults.
///
/// Gate rejections are not errors; they are the
/// [`PromotionDecision::Rejected`] outcome.
#[derive(Debug, Error)]
pub enum PromoteError {
    /// The skill is not in the registry.
    #[error("skill not found: {0}")]
    UnknownSkill(String),
    /// The skill has no staging version to promote.
    #[error("skill {0} has no staging version")]
    NoStagingVersion(String),
    /// The staging artifact directory is missing.
    #[error("staging artifact missing at {0}")]
    MissingArtifact(PathBuf),
    /// Evaluation case data could not be loaded.
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// Registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Audit append failed.
    #[error(transparent)]
    Audit(#[from] AuditError),
    /// The prod-tree copy failed; the registry was not updated.
    #[error("prod tree copy failed: {0}")]
    CopyFailed(String),
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Decision of one promotion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionDecision {
    /// All gates passed; the version is now prod.
    Promoted {
        /// Per-category reports in execution order.
        reports: Vec<GateReport>,
    },
    /// One or more gates failed; nothing was copied or repointed.
    Rejected {
        /// Categories that failed, in execution order.
        failed_gates: Vec<GateCategory>,
        /// Per-category reports in execution order.
        reports: Vec<GateReport>,
    },
}

/// Outcome of promoting every eligible skill.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromoteAllReport {
    /// Skills promoted to prod.
    pub promoted: Vec<String>,
    /// Skills rejected by gates or missing artifacts.
    pub failed: Vec<String>,
    /// Skills without a staging version.
    pub skipped: Vec<String>,
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Promoter paths.
#[derive(Debug, Clone)]
pub struct PromoterConfig {
    /// Staging area root.
    pub staging_path: PathBuf,
    /// Production area root.
    pub prod_path: PathBuf,
    /// Registry document path.
    pub registry_path: PathBuf,
    /// Evaluation data root.
    pub eval_dir: PathBuf,
    /// Audit log path.
    pub audit_log_path: PathBuf,
}

// ============================================================================
// SECTION: Promoter
// ============================================================================

/// Staging-to-prod promoter.
pub struct Promoter {
    /// Paths for this promoter.
    config: PromoterConfig,
    /// Registry store.
    registry: Registry,
    /// Audit logger.
    audit: AuditLogger,
    /// Evaluation gate executor.
    eval_gate: EvalGate,
}

impl Promoter {
    /// Builds a promoter over the given paths and artifact backend.
    #[must_use]
    pub fn new(config: PromoterConfig, backend: Arc<dyn ArtifactBackend>) -> Self {
        let registry = Registry::new(&config.registry_path);
        let audit = AuditLogger::new(&config.audit_log_path);
        let eval_gate = EvalGate::new(config.eval_dir.clone(), backend);
        Self {
            config,
            registry,
            audit,
            eval_gate,
        }
    }

    /// Promotes one skill's staging version through the three gates.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError`] for absent prerequisites and infrastructure
    /// faults; gate failures are the `Rejected` decision, not errors.
    pub fn promote_skill(&self, skill_name: &SkillName) -> Result<PromotionDecision, PromoteError> {
        let entry = self
            .registry
            .get_entry(skill_name.as_str())?
            .ok_or_else(|| PromoteError::UnknownSkill(skill_name.as_str().to_string()))?;
        let staging_version = entry
            .current_staging
            .ok_or_else(|| PromoteError::NoStagingVersion(skill_name.as_str().to_string()))?;

        let artifact_dir = self
            .config
            .staging_path
            .join(skill_name.as_str())
            .join(staging_version.as_str());
        if !artifact_dir.is_dir() {
            return Err(PromoteError::MissingArtifact(artifact_dir));
        }

        // Run the three gates in order.
        let mut reports = Vec::with_capacity(GateCategory::ALL.len());
        for category in GateCategory::ALL {
            let report = self.eval_gate.run_gate(
                category,
                skill_name.as_str(),
                &artifact_dir,
                category.standard_threshold(),
            )?;
            reports.push(report);
        }

        // Record combined gate outcomes on the staging version.
        let outcomes: BTreeMap<String, _> = reports
            .iter()
            .map(|report| (report.gate.as_str().to_string(), report.to_outcome_record()))
            .collect();
        self.registry.set_promote_gate(skill_name, &staging_version, outcomes)?;

        let failed_gates: Vec<GateCategory> =
            reports.iter().filter(|r| !r.gate_passed).map(|r| r.gate).collect();
        if !failed_gates.is_empty() {
            let joined = failed_gates
                .iter()
                .map(|gate| gate.as_str())
                .collect::<Vec<_>>()
                .join(",");
            self.audit.append(
                &AuditEvent::new(AuditOperation::PromoteFailed)
                    .field("skill", skill_name)
                    .field("version", &staging_version)
                    .field("failed_gates", joined),
            )?;
            return Ok(PromotionDecision::Rejected {
                failed_gates,
                reports,
            });
        }

        // Copy into prod before repointing the registry.
        let prod_dir = self
            .config
            .prod_path
            .join(skill_name.as_str())
            .join(staging_version.as_str());
        copy_into_place(&artifact_dir, &prod_dir).map_err(PromoteError::CopyFailed)?;

        self.registry.promote(skill_name, &staging_version)?;

        self.audit.append(
            &AuditEvent::new(AuditOperation::Promote)
                .field("skill", skill_name)
                .field("version", &staging_version)
                .field("replay_rate", rate_field(&reports, GateCategory::Replay))
                .field("regression_rate", rate_field(&reports, GateCategory::Regression))
                .field("redteam_rate", rate_field(&reports, GateCategory::Redteam)),
        )?;

        Ok(PromotionDecision::Promoted {
            reports,
        })
    }

    /// Promotes every skill with a staging version.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError`] for infrastructure faults; per-skill gate
    /// rejections and missing artifacts are accounted in the report.
    pub fn promote_all(&self) -> Result<PromoteAllReport, PromoteError> {
        let mut report = PromoteAllReport::default();

        for skill in self.registry.list_skills()? {
            let Some(entry) = self.registry.get_entry(&skill)? else {
                continue;
            };
            if entry.current_staging.is_none() {
                report.skipped.push(skill);
                continue;
            }
            match self.promote_skill(&entry.name) {
                Ok(PromotionDecision::Promoted {
                    ..
                }) => report.promoted.push(skill),
                Ok(PromotionDecision::Rejected {
                    ..
                })
                | Err(PromoteError::MissingArtifact(_)) => report.failed.push(skill),
                Err(err) => return Err(err),
            }
        }

        Ok(report)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats a category pass rate with two fractional digits.
fn rate_field(reports: &[GateReport], category: GateCategory) -> String {
    reports
        .iter()
        .find(|report| report.gate == category)
        .map_or_else(|| "0.00".to_string(), |report| format!("{:.2}", report.pass_rate))
}

/// Copies the artifact tree into prod via a sibling temp directory and an
/// atomic rename; any pre-existing target is removed first.
fn copy_into_place(source: &Path, target: &Path) -> Result<(), String> {
    let parent = target
        .parent()
        .ok_or_else(|| format!("prod target {} has no parent", target.display()))?;
    std::fs::create_dir_all(parent)
        .map_err(|err| format!("prod directory unavailable: {err}"))?;

    let staged = parent.join(format!(
        ".tmp-{}",
        target.file_name().and_then(|n| n.to_str()).unwrap_or("incoming")
    ));
    if staged.exists() {
        std::fs::remove_dir_all(&staged)
            .map_err(|err| format!("stale temp tree removal failed: {err}"))?;
    }

    if let Err(detail) = copy_tree(source, &staged) {
        let _ = std::fs::remove_dir_all(&staged);
        return Err(detail);
    }

    if target.exists() {
        std::fs::remove_dir_all(target)
            .map_err(|err| format!("existing prod tree removal failed: {err}"))?;
    }
    std::fs::rename(&staged, target).map_err(|err| {
        let _ = std::fs::remove_dir_all(&staged);
        format!("prod tree rename failed: {err}")
    })
}

/// Recursively copies a directory tree.
fn copy_tree(source: &Path, target: &Path) -> Result<(), String> {
    std::fs::create_dir_all(target).map_err(|err| format!("copy mkdir failed: {err}"))?;
    let entries =
        std::fs::read_dir(source).map_err(|err| format!("copy read_dir failed: {err}"))?;
    for entry in entries {
        let entry = entry.map_err(|err| format!("copy read_dir failed: {err}"))?;
        let source_path = entry.path();
        let target_path = target.join(entry.file_name());
        let file_type =
            entry.file_type().map_err(|err| format!("copy file_type failed: {err}"))?;
        if file_type.is_dir() {
            copy_tree(&source_path, &target_path)?;
        } else {
            std::fs::copy(&source_path, &target_path)
                .map_err(|err| format!("copy failed for {}: {err}", source_path.display()))?;
        }
    }
    Ok(())
}
