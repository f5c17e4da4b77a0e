// crates/skill-gate-pipeline/src/loader.rs
// ============================================================================
// Module: Production Artifact Loader
// Description: Registry-resolved loading of prod artifacts with entry handles.
// Purpose: Give the runtime validated, callable access to promoted skills.
// Dependencies: skill-gate-{core,registry}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The loader resolves a skill name (and optional pinned version) to its
//! prod artifact directory using the registry's `current_prod` pointer,
//! validates the manifest against the schema and MVP constraints, and hands
//! out callable handles for the `action` and `verify` entry points backed
//! by an [`ArtifactBackend`]. Loads are cached by `(name, version)`, but an
//! unpinned lookup always re-reads the registry first, so a promote or
//! rollback is visible immediately.
//!
//! Error categories are distinct and typed: missing prod version, missing
//! files, invalid manifest, missing entry points, and backend faults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Map;
use serde_json::Value;
use skill_gate_core::ActionOutcome;
use skill_gate_core::ArtifactBackend;
use skill_gate_core::BackendError;
use skill_gate_core::ManifestValidator;
use skill_gate_core::SchemaError;
use skill_gate_core::SkillManifest;
use skill_gate_core::VerifyOutcome;
use skill_gate_core::VersionId;
use skill_gate_registry::Registry;
use skill_gate_registry::RegistryError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Loader errors, distinguishable by the caller.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No production version exists for the skill.
    #[error("no production version found for skill: {0}")]
    NoProdVersion(String),
    /// The artifact directory or source file is missing.
    #[error("missing artifact file: {0}")]
    MissingArtifact(PathBuf),
    /// The manifest file is missing.
    #[error("missing manifest: {0}")]
    MissingManifest(PathBuf),
    /// The manifest failed schema or policy validation.
    #[error("manifest validation failed: {0}")]
    InvalidManifest(String),
    /// The artifact lacks a required entry point.
    #[error("skill {skill} has no callable {symbol}()")]
    MissingEntryPoint {
        /// Skill name.
        skill: String,
        /// Missing symbol name.
        symbol: String,
    },
    /// Registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Artifact backend fault.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// Manifest schema compilation failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// ============================================================================
// SECTION: Loaded Artifacts
// ============================================================================

/// A loaded prod artifact with its validated manifest.
#[derive(Debug, Clone)]
pub struct LoadedSkill {
    /// Skill name.
    pub name: String,
    /// Resolved version.
    pub version: VersionId,
    /// Artifact directory on disk.
    pub path: PathBuf,
    /// Validated manifest.
    pub manifest: SkillManifest,
}

/// Callable handle for a skill's `action` entry point.
#[derive(Clone)]
pub struct ActionHandle {
    /// Backend executing the invocation.
    backend: Arc<dyn ArtifactBackend>,
    /// Artifact directory.
    artifact_dir: PathBuf,
}

impl ActionHandle {
    /// Invokes `action` with named arguments under a wall-clock timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] for backend infrastructure faults;
    /// in-artifact failures are reported inside the outcome.
    pub fn invoke(
        &self,
        input: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<ActionOutcome, BackendError> {
        self.backend.invoke_action(&self.artifact_dir, input, timeout)
    }
}

/// Callable handle for a skill's `verify` entry point.
#[derive(Clone)]
pub struct VerifyHandle {
    /// Backend executing the invocation.
    backend: Arc<dyn ArtifactBackend>,
    /// Artifact directory.
    artifact_dir: PathBuf,
}

impl VerifyHandle {
    /// Invokes `verify` under a wall-clock timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] for backend infrastructure faults.
    pub fn invoke(&self, timeout: Duration) -> Result<VerifyOutcome, BackendError> {
        self.backend.invoke_verify(&self.artifact_dir, timeout)
    }
}

// ============================================================================
// SECTION: Loader
// ============================================================================

/// Production skill loader.
///
/// # Invariants
/// - Unpinned lookups re-read the registry; the cache is keyed by
///   `(name, version)` only after resolution.
pub struct SkillLoader {
    /// Production area root.
    prod_path: PathBuf,
    /// Registry store.
    registry: Registry,
    /// Manifest validator.
    validator: ManifestValidator,
    /// Artifact backend for entry-point handles and probing.
    backend: Arc<dyn ArtifactBackend>,
    /// Loads cached by `(name, version)`.
    cache: RefCell<HashMap<(String, String), LoadedSkill>>,
}

impl SkillLoader {
    /// Builds a loader enforcing MVP manifest constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the manifest schema fails to compile.
    pub fn new(
        prod_path: impl Into<PathBuf>,
        registry_path: impl Into<PathBuf>,
        backend: Arc<dyn ArtifactBackend>,
    ) -> Result<Self, SchemaError> {
        Self::with_options(prod_path, registry_path, backend, true)
    }

    /// Builds a loader with explicit MVP enforcement selection.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the manifest schema fails to compile.
    pub fn with_options(
        prod_path: impl Into<PathBuf>,
        registry_path: impl Into<PathBuf>,
        backend: Arc<dyn ArtifactBackend>,
        enforce_mvp_constraints: bool,
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            prod_path: prod_path.into(),
            registry: Registry::new(registry_path.into()),
            validator: ManifestValidator::with_options(enforce_mvp_constraints)?,
            backend,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Resolves the effective version, re-reading the registry when no pin
    /// is given.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NoProdVersion`] when the registry has no prod
    /// pointer for the skill.
    pub fn resolve_version(
        &self,
        name: &str,
        version: Option<&VersionId>,
    ) -> Result<VersionId, LoadError> {
        if let Some(version) = version {
            return Ok(version.clone());
        }
        let entry = self.registry.get_entry(name)?;
        entry
            .and_then(|entry| entry.current_prod)
            .ok_or_else(|| LoadError::NoProdVersion(name.to_string()))
    }

    /// Loads a prod skill (manifest validated), cached per `(name, version)`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] with the distinct category for each failure
    /// mode (missing files, invalid manifest, registry faults).
    pub fn load(&self, name: &str, version: Option<&VersionId>) -> Result<LoadedSkill, LoadError> {
        let resolved = self.resolve_version(name, version)?;
        let cache_key = (name.to_string(), resolved.as_str().to_string());
        if let Some(hit) = self.cache.borrow().get(&cache_key) {
            return Ok(hit.clone());
        }

        let skill_dir = self.prod_path.join(name).join(resolved.as_str());
        let code_path = skill_dir.join("skill.py");
        if !code_path.is_file() {
            return Err(LoadError::MissingArtifact(code_path));
        }

        let manifest_path = skill_dir.join("skill.json");
        if !manifest_path.is_file() {
            return Err(LoadError::MissingManifest(manifest_path));
        }
        let manifest_text = std::fs::read_to_string(&manifest_path)
            .map_err(|_| LoadError::MissingManifest(manifest_path.clone()))?;
        let manifest_value: Value = serde_json::from_str(&manifest_text)
            .map_err(|err| LoadError::InvalidManifest(err.to_string()))?;

        let report = self.validator.validate(&manifest_value);
        if !report.valid {
            return Err(LoadError::InvalidManifest(report.errors.join("; ")));
        }
        let manifest: SkillManifest = serde_json::from_value(manifest_value)
            .map_err(|err| LoadError::InvalidManifest(err.to_string()))?;

        let loaded = LoadedSkill {
            name: name.to_string(),
            version: resolved,
            path: skill_dir,
            manifest,
        };
        self.cache.borrow_mut().insert(cache_key, loaded.clone());
        Ok(loaded)
    }

    /// Returns a callable handle for the skill's `action` entry point.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingEntryPoint`] when the artifact does not
    /// define a callable `action`.
    pub fn action_handle(
        &self,
        name: &str,
        version: Option<&VersionId>,
    ) -> Result<ActionHandle, LoadError> {
        let loaded = self.load(name, version)?;
        let symbols = self.backend.probe(&loaded.path)?;
        if !symbols.has_action {
            return Err(LoadError::MissingEntryPoint {
                skill: name.to_string(),
                symbol: "action".to_string(),
            });
        }
        Ok(ActionHandle {
            backend: Arc::clone(&self.backend),
            artifact_dir: loaded.path,
        })
    }

    /// Returns a callable handle for the skill's `verify` entry point.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingEntryPoint`] when the artifact does not
    /// define a callable `verify`.
    pub fn verify_handle(
        &self,
        name: &str,
        version: Option<&VersionId>,
    ) -> Result<VerifyHandle, LoadError> {
        let loaded = self.load(name, version)?;
        let symbols = self.backend.probe(&loaded.path)?;
        if !symbols.has_verify {
            return Err(LoadError::MissingEntryPoint {
                skill: name.to_string(),
                symbol: "verify".to_string(),
            });
        }
        Ok(VerifyHandle {
            backend: Arc::clone(&self.backend),
            artifact_dir: loaded.path,
        })
    }
}
