// crates/skill-gate-pipeline/src/evolver.rs
// ============================================================================
// Module: Evolution Controller
// Description: Queue-to-staging pipeline over the trust gates.
// Purpose: Drive each pending item through generate, gate, stage, sandbox, register.
// Dependencies: crate::queue_io, serde, serde_json, skill-gate-{core,policy,registry}, thiserror
// ============================================================================

//! ## Overview
//! One controller run processes pending queue items sequentially: generate
//! the artifact, run the static gate, validate the manifest, write staging
//! files, verify in the sandbox when available, and record the staging
//! version in the registry. Every step emits its audit event, registry and
//! audit writes for an item are totally ordered, and a failing item never
//! aborts the batch. The queue is re-saved once at the end of the run.
//!
//! Generator `UnknownCapability` errors downgrade to a per-item failure
//! with `GENERATE_FAILED`; any other unexpected condition emits `ERROR` and
//! also fails only its item.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use skill_gate_core::AstGateRecord;
use skill_gate_core::DEFAULT_HASH_ALGORITHM;
use skill_gate_core::GenerateError;
use skill_gate_core::ItemStatus;
use skill_gate_core::ManifestValidator;
use skill_gate_core::QueueItem;
use skill_gate_core::SandboxExecutor;
use skill_gate_core::SandboxRecord;
use skill_gate_core::SchemaError;
use skill_gate_core::SkillGenerator;
use skill_gate_core::SkillPackage;
use skill_gate_core::ValidationRecord;
use skill_gate_core::VersionId;
use skill_gate_core::hashing::hash_bytes;
use skill_gate_core::hashing::hash_canonical_json;
use skill_gate_policy::PolicyError;
use skill_gate_policy::StaticGate;
use skill_gate_registry::AuditError;
use skill_gate_registry::AuditEvent;
use skill_gate_registry::AuditLogger;
use skill_gate_registry::AuditOperation;
use skill_gate_registry::Registry;
use thiserror::Error;

use crate::queue_io::QueueError;
use crate::queue_io::QueueStore;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Evolution run configuration.
#[derive(Debug, Clone)]
pub struct EvolveConfig {
    /// Work queue document path.
    pub queue_path: PathBuf,
    /// Staging area root.
    pub staging_path: PathBuf,
    /// Registry document path.
    pub registry_path: PathBuf,
    /// Optional audit log path.
    pub audit_log_path: Option<PathBuf>,
    /// Skip sandbox verification entirely.
    pub skip_sandbox: bool,
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Per-run item accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EvolveSummary {
    /// Items that entered processing.
    pub processed: usize,
    /// Items that reached staging.
    pub succeeded: usize,
    /// Items rejected or errored.
    pub failed: usize,
    /// Items skipped because they were not pending.
    pub skipped: usize,
}

/// Full report of one controller run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolveReport {
    /// Item accounting.
    pub summary: EvolveSummary,
    /// Whether sandbox verification actually ran this pass.
    pub sandbox_active: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Controller-fatal errors (per-item faults never surface here).
#[derive(Debug, Error)]
pub enum EvolveError {
    /// Static gate construction failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// Manifest schema compilation failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Queue persistence failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Per-item fault classification.
enum ItemFault {
    /// The item was rejected by a gate; its audit event is already written.
    Rejected,
    /// The generator had no skill for the capability.
    UnknownCapability(String),
    /// An unexpected condition interrupted the item.
    Unexpected(String),
}

impl From<AuditError> for ItemFault {
    fn from(err: AuditError) -> Self {
        Self::Unexpected(err.to_string())
    }
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// The queue-to-staging orchestrator.
pub struct EvolutionController<'a> {
    /// Run configuration.
    config: EvolveConfig,
    /// Injected artifact generator.
    generator: &'a dyn SkillGenerator,
    /// Injected isolation sandbox.
    sandbox: &'a dyn SandboxExecutor,
    /// Static gate over the default policy tables.
    static_gate: StaticGate,
    /// Manifest validator with MVP enforcement.
    manifest_validator: ManifestValidator,
    /// Registry store.
    registry: Registry,
    /// Optional audit logger.
    audit: Option<AuditLogger>,
}

impl<'a> EvolutionController<'a> {
    /// Builds a controller for one run.
    ///
    /// # Errors
    ///
    /// Returns [`EvolveError`] when the static gate or manifest schema fail
    /// to build.
    pub fn new(
        config: EvolveConfig,
        generator: &'a dyn SkillGenerator,
        sandbox: &'a dyn SandboxExecutor,
    ) -> Result<Self, EvolveError> {
        let static_gate = StaticGate::with_defaults()?;
        let manifest_validator = ManifestValidator::new()?;
        let registry = Registry::new(&config.registry_path);
        let audit = config.audit_log_path.as_ref().map(AuditLogger::new);
        Ok(Self {
            config,
            generator,
            sandbox,
            static_gate,
            manifest_validator,
            registry,
            audit,
        })
    }

    /// Processes every pending queue item and re-saves the queue once.
    ///
    /// # Errors
    ///
    /// Returns [`EvolveError`] only for run-fatal conditions (queue
    /// persistence); item-level faults are counted in the summary.
    pub fn run(&self) -> Result<EvolveReport, EvolveError> {
        let store = QueueStore::new(&self.config.queue_path);
        let mut queue = store.load()?;

        let sandbox_active = !self.config.skip_sandbox && self.sandbox.is_available();

        let mut summary = EvolveSummary::default();
        for item in &mut queue.items {
            if item.status != ItemStatus::Pending {
                summary.skipped += 1;
                continue;
            }

            summary.processed += 1;
            item.status = ItemStatus::Processing;

            match self.process_item(item, sandbox_active) {
                Ok(()) => {
                    item.status = ItemStatus::Completed;
                    summary.succeeded += 1;
                }
                Err(fault) => {
                    self.record_fault(item, &fault);
                    item.status = ItemStatus::Failed;
                    summary.failed += 1;
                }
            }
        }

        store.save(&mut queue)?;
        Ok(EvolveReport {
            summary,
            sandbox_active,
        })
    }

    /// Drives one item through the gates into staging.
    fn process_item(&self, item: &QueueItem, sandbox_active: bool) -> Result<(), ItemFault> {
        self.emit(
            AuditEvent::new(AuditOperation::Generate)
                .field("capability", &item.capability)
                .field("item_id", &item.id),
        )?;

        let package = match self.generator.generate_skill(&item.capability, &item.context) {
            Ok(package) => package,
            Err(GenerateError::UnknownCapability(capability)) => {
                return Err(ItemFault::UnknownCapability(capability));
            }
            Err(GenerateError::Provider(detail)) => {
                return Err(ItemFault::Unexpected(detail));
            }
        };

        let mut validation = ValidationRecord::default();

        // Static gate.
        let gate_result = self.static_gate.check(&package.code);
        validation.ast_gate = Some(AstGateRecord {
            passed: gate_result.passed,
            violations: gate_result.violations.clone(),
        });
        self.emit(
            AuditEvent::new(AuditOperation::AstGate)
                .field("skill", &package.name)
                .field("passed", gate_result.passed)
                .field("violations", gate_result.violations.len()),
        )?;
        if !gate_result.passed {
            return Err(ItemFault::Rejected);
        }

        // Manifest validation.
        let report = self.manifest_validator.validate(&package.manifest);
        if !report.valid {
            self.emit(
                AuditEvent::new(AuditOperation::ManifestInvalid)
                    .field("skill", &package.name)
                    .field("errors", report.errors.join("; ")),
            )?;
            return Err(ItemFault::Rejected);
        }

        // Staging write.
        let version = manifest_version(&package.manifest).map_err(ItemFault::Unexpected)?;
        let skill_dir = write_to_staging(&self.config.staging_path, &package, &version)
            .map_err(ItemFault::Unexpected)?;
        self.emit(
            AuditEvent::new(AuditOperation::Staging)
                .field("skill", &package.name)
                .field("version", &version)
                .field("path", skill_dir.display()),
        )?;

        // Sandbox verification.
        if sandbox_active {
            let decision = self.sandbox.run(&skill_dir);
            let metrics_value = serde_json::to_value(&decision.metrics)
                .map_err(|err| ItemFault::Unexpected(err.to_string()))?;
            validation.sandbox = Some(SandboxRecord {
                passed: Some(decision.passed),
                skipped: None,
                metrics: Some(metrics_value),
            });
            self.emit(
                AuditEvent::new(AuditOperation::Sandbox)
                    .field("skill", &package.name)
                    .field("passed", decision.passed)
                    .field("duration_ms", decision.metrics.duration_ms),
            )?;
            if !decision.passed {
                return Err(ItemFault::Rejected);
            }
        } else {
            validation.sandbox = Some(SandboxRecord {
                passed: None,
                skipped: Some(true),
                metrics: None,
            });
        }

        // Registry update.
        let code_hash = hash_bytes(DEFAULT_HASH_ALGORITHM, package.code.as_bytes()).into_hex();
        let manifest_hash = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &package.manifest)
            .map_err(|err| ItemFault::Unexpected(err.to_string()))?
            .into_hex();
        self.registry
            .add_staging(&package.name, &version, code_hash, manifest_hash, validation)
            .map_err(|err| ItemFault::Unexpected(err.to_string()))?;

        Ok(())
    }

    /// Writes the audit record for a failed item; best-effort by design.
    fn record_fault(&self, item: &QueueItem, fault: &ItemFault) {
        let event = match fault {
            ItemFault::Rejected => return,
            ItemFault::UnknownCapability(capability) => {
                AuditEvent::new(AuditOperation::GenerateFailed)
                    .field("capability", &item.capability)
                    .field("error", format!("unknown capability: {capability}"))
            }
            ItemFault::Unexpected(detail) => AuditEvent::new(AuditOperation::Error)
                .field("capability", &item.capability)
                .field("error", detail),
        };
        if let Some(audit) = &self.audit {
            let _ = audit.append(&event);
        }
    }

    /// Emits an audit event when a logger is configured.
    fn emit(&self, event: AuditEvent) -> Result<(), AuditError> {
        match &self.audit {
            Some(audit) => audit.append(&event),
            None => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Staging Writes
// ============================================================================

/// Extracts and validates the manifest version, defaulting to `1.0.0`.
fn manifest_version(manifest: &Value) -> Result<VersionId, String> {
    let raw = manifest.get("version").and_then(Value::as_str).unwrap_or("1.0.0");
    VersionId::new(raw).map_err(|err| err.to_string())
}

/// Writes `skill.py` and `skill.json` under `<staging>/<name>/<version>/`.
fn write_to_staging(
    staging_path: &Path,
    package: &SkillPackage,
    version: &VersionId,
) -> Result<PathBuf, String> {
    let skill_dir = staging_path.join(package.name.as_str()).join(version.as_str());
    std::fs::create_dir_all(&skill_dir)
        .map_err(|err| format!("staging directory unavailable: {err}"))?;

    std::fs::write(skill_dir.join("skill.py"), &package.code)
        .map_err(|err| format!("staging code write failed: {err}"))?;

    let manifest_text = serde_json::to_string_pretty(&package.manifest)
        .map_err(|err| format!("manifest encoding failed: {err}"))?;
    std::fs::write(skill_dir.join("skill.json"), manifest_text)
        .map_err(|err| format!("staging manifest write failed: {err}"))?;

    Ok(skill_dir)
}
