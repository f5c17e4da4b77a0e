// crates/skill-gate-registry/src/store.rs
// ============================================================================
// Module: File-Backed Registry Store
// Description: Locked load-mutate-save over the canonical registry document.
// Purpose: Enforce lifecycle invariants across staging, promote, and rollback.
// Dependencies: fs2, serde_json, skill-gate-core, tempfile, thiserror
// ============================================================================

//! ## Overview
//! Every mutating operation takes an exclusive advisory lock on a sibling
//! lock file, loads the document, applies one transition, and saves through
//! an atomic temp-file rename with a fresh `updated_at`. A missing registry
//! file loads as the empty registry; an unreadable or unparsable file is
//! corruption and fails the operation. Reads do not lock.
//!
//! Lifecycle invariants enforced here:
//! - only a staging version is promotable; promoting the current prod again
//!   is a documented no-op;
//! - promotion disables the prior prod with reason `Superseded by <V>`;
//! - only previously-promoted versions are rollback targets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use fs2::FileExt;
use skill_gate_core::GateOutcomeRecord;
use skill_gate_core::RegistryData;
use skill_gate_core::SkillEntry;
use skill_gate_core::SkillName;
use skill_gate_core::SkillVersion;
use skill_gate_core::Timestamp;
use skill_gate_core::ValidationRecord;
use skill_gate_core::VersionId;
use skill_gate_core::VersionStatus;
use tempfile::NamedTempFile;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling; the CLI maps every
///   variant to a non-zero exit.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Filesystem operation failed.
    #[error("registry I/O failed at {path}: {detail}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// I/O diagnostic detail.
        detail: String,
    },
    /// The registry file exists but cannot be decoded.
    #[error("registry file corrupt at {path}: {detail}")]
    Corrupt {
        /// Offending path.
        path: PathBuf,
        /// Decoder diagnostic detail.
        detail: String,
    },
    /// The exclusive lock could not be acquired.
    #[error("registry lock failed: {0}")]
    Lock(String),
    /// The named skill does not exist.
    #[error("skill not found: {0}")]
    UnknownSkill(String),
    /// The named version does not exist for the skill.
    #[error("version not found: {skill} {version}")]
    UnknownVersion {
        /// Skill name.
        skill: String,
        /// Missing version.
        version: String,
    },
    /// Promotion requested for a version that is not in staging.
    #[error("version {version} of {skill} is not in staging")]
    NotStaging {
        /// Skill name.
        skill: String,
        /// Offending version.
        version: String,
    },
    /// Rollback requested to a version that was never promoted.
    #[error("cannot rollback {skill} to {version}: version was never promoted to production")]
    NeverPromoted {
        /// Skill name.
        skill: String,
        /// Ineligible target version.
        version: String,
    },
}

// ============================================================================
// SECTION: Operation Outcomes
// ============================================================================

/// Outcome of a promote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoteOutcome {
    /// The version moved to prod.
    Promoted {
        /// Prior prod version that was disabled, when any.
        superseded: Option<VersionId>,
    },
    /// The version is already the current prod; nothing changed.
    AlreadyProd,
}

/// Outcome of a rollback operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackOutcome {
    /// Prod version before the rollback, when any.
    pub from: Option<VersionId>,
    /// Version that was disabled by the rollback, when any.
    pub disabled: Option<VersionId>,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// File-backed skill registry.
///
/// # Invariants
/// - Mutations run under the exclusive lock; saves are atomic renames.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Registry document path.
    path: PathBuf,
}

impl Registry {
    /// Creates a registry over the given document path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the registry document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the registry document; a missing file is the empty registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Corrupt`] when the file exists but cannot be
    /// decoded, and [`RegistryError::Io`] on read failures.
    pub fn load(&self) -> Result<RegistryData, RegistryError> {
        if !self.path.exists() {
            return Ok(RegistryData::empty(Timestamp::now()));
        }
        let text = std::fs::read_to_string(&self.path).map_err(|err| RegistryError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|err| RegistryError::Corrupt {
            path: self.path.clone(),
            detail: err.to_string(),
        })
    }

    /// Saves the registry document atomically, refreshing `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] when the temp file cannot be written or
    /// renamed into place.
    pub fn save(&self, data: &mut RegistryData) -> Result<(), RegistryError> {
        data.updated_at = Timestamp::now();

        let parent = self.path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        std::fs::create_dir_all(&parent).map_err(|err| RegistryError::Io {
            path: parent.clone(),
            detail: err.to_string(),
        })?;

        let mut encoded =
            serde_json::to_vec_pretty(data).map_err(|err| RegistryError::Io {
                path: self.path.clone(),
                detail: err.to_string(),
            })?;
        encoded.push(b'\n');

        let mut temp = NamedTempFile::new_in(&parent).map_err(|err| RegistryError::Io {
            path: parent.clone(),
            detail: err.to_string(),
        })?;
        temp.write_all(&encoded).map_err(|err| RegistryError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        })?;
        temp.persist(&self.path).map_err(|err| RegistryError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        })?;
        Ok(())
    }

    /// Inserts a new staging version and points `current_staging` at it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on lock, load, or save failures.
    pub fn add_staging(
        &self,
        name: &SkillName,
        version: &VersionId,
        code_hash: String,
        manifest_hash: String,
        validation: ValidationRecord,
    ) -> Result<SkillVersion, RegistryError> {
        let _lock = self.exclusive_lock()?;
        let mut data = self.load()?;

        let skill_version = SkillVersion {
            version: version.clone(),
            code_hash,
            manifest_hash,
            created_at: Timestamp::now(),
            status: VersionStatus::Staging,
            validation,
            promoted_at: None,
            disabled_at: None,
            disabled_reason: None,
        };

        let entry = data
            .skills
            .entry(name.as_str().to_string())
            .or_insert_with(|| SkillEntry::new(name.clone()));
        entry.versions.insert(version.as_str().to_string(), skill_version.clone());
        entry.current_staging = Some(version.clone());

        self.save(&mut data)?;
        Ok(skill_version)
    }

    /// Promotes a staging version to prod, superseding any prior prod.
    ///
    /// Promoting the version that is already prod is a documented no-op and
    /// reports [`PromoteOutcome::AlreadyProd`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSkill`] / [`RegistryError::UnknownVersion`]
    /// for missing prerequisites and [`RegistryError::NotStaging`] when the
    /// version is not promotable.
    pub fn promote(
        &self,
        name: &SkillName,
        version: &VersionId,
    ) -> Result<PromoteOutcome, RegistryError> {
        let _lock = self.exclusive_lock()?;
        let mut data = self.load()?;

        let entry = data
            .skills
            .get_mut(name.as_str())
            .ok_or_else(|| RegistryError::UnknownSkill(name.as_str().to_string()))?;

        let status = entry
            .versions
            .get(version.as_str())
            .map(|v| v.status)
            .ok_or_else(|| RegistryError::UnknownVersion {
                skill: name.as_str().to_string(),
                version: version.as_str().to_string(),
            })?;

        if status == VersionStatus::Prod && entry.current_prod.as_ref() == Some(version) {
            return Ok(PromoteOutcome::AlreadyProd);
        }
        if status != VersionStatus::Staging {
            return Err(RegistryError::NotStaging {
                skill: name.as_str().to_string(),
                version: version.as_str().to_string(),
            });
        }

        let now = Timestamp::now();
        let superseded = entry.current_prod.clone().filter(|prior| prior != version);
        if let Some(prior) = &superseded
            && let Some(old_prod) = entry.versions.get_mut(prior.as_str())
        {
            old_prod.status = VersionStatus::Disabled;
            old_prod.disabled_at = Some(now);
            old_prod.disabled_reason = Some(format!("Superseded by {version}"));
        }

        if let Some(target) = entry.versions.get_mut(version.as_str()) {
            target.status = VersionStatus::Prod;
            target.promoted_at = Some(now);
        }
        entry.current_prod = Some(version.clone());
        if entry.current_staging.as_ref() == Some(version) {
            entry.current_staging = None;
        }

        self.save(&mut data)?;
        Ok(PromoteOutcome::Promoted {
            superseded,
        })
    }

    /// Rolls prod back to a previously-promoted target version.
    ///
    /// # Errors
    ///
    /// Fails fast, before any mutation, with
    /// [`RegistryError::UnknownSkill`], [`RegistryError::UnknownVersion`], or
    /// [`RegistryError::NeverPromoted`].
    pub fn rollback(
        &self,
        name: &SkillName,
        target: &VersionId,
    ) -> Result<RollbackOutcome, RegistryError> {
        let _lock = self.exclusive_lock()?;
        let mut data = self.load()?;

        let entry = data
            .skills
            .get_mut(name.as_str())
            .ok_or_else(|| RegistryError::UnknownSkill(name.as_str().to_string()))?;

        let target_version =
            entry.versions.get(target.as_str()).ok_or_else(|| RegistryError::UnknownVersion {
                skill: name.as_str().to_string(),
                version: target.as_str().to_string(),
            })?;
        if target_version.promoted_at.is_none() {
            return Err(RegistryError::NeverPromoted {
                skill: name.as_str().to_string(),
                version: target.as_str().to_string(),
            });
        }

        let from = entry.current_prod.clone();
        let disabled = from.clone().filter(|current| current != target);
        if let Some(current) = &disabled
            && let Some(outgoing) = entry.versions.get_mut(current.as_str())
        {
            outgoing.status = VersionStatus::Disabled;
            outgoing.disabled_at = Some(Timestamp::now());
            outgoing.disabled_reason = Some(format!("Rollback to {target}"));
        }

        if let Some(restored) = entry.versions.get_mut(target.as_str()) {
            restored.status = VersionStatus::Prod;
        }
        entry.current_prod = Some(target.clone());

        self.save(&mut data)?;
        Ok(RollbackOutcome {
            from,
            disabled,
        })
    }

    /// Records promotion gate outcomes under a version's validation record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the skill or version is missing.
    pub fn set_promote_gate(
        &self,
        name: &SkillName,
        version: &VersionId,
        outcomes: BTreeMap<String, GateOutcomeRecord>,
    ) -> Result<(), RegistryError> {
        let _lock = self.exclusive_lock()?;
        let mut data = self.load()?;

        let entry = data
            .skills
            .get_mut(name.as_str())
            .ok_or_else(|| RegistryError::UnknownSkill(name.as_str().to_string()))?;
        let record = entry.versions.get_mut(version.as_str()).ok_or_else(|| {
            RegistryError::UnknownVersion {
                skill: name.as_str().to_string(),
                version: version.as_str().to_string(),
            }
        })?;
        record.validation.promote_gate = Some(outcomes);

        self.save(&mut data)
    }

    /// Looks up a skill entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on load failures.
    pub fn get_entry(&self, name: &str) -> Result<Option<SkillEntry>, RegistryError> {
        Ok(self.load()?.skills.get(name).cloned())
    }

    /// Lists every skill name in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on load failures.
    pub fn list_skills(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.load()?.skills.keys().cloned().collect())
    }

    /// Acquires the exclusive advisory lock for a mutation.
    fn exclusive_lock(&self) -> Result<File, RegistryError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| RegistryError::Io {
                path: parent.to_path_buf(),
                detail: err.to_string(),
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|err| RegistryError::Io {
                path: lock_path,
                detail: err.to_string(),
            })?;
        file.lock_exclusive().map_err(|err| RegistryError::Lock(err.to_string()))?;
        Ok(file)
    }

    /// Returns the sibling lock file path.
    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map_or_else(
            || std::ffi::OsString::from("registry"),
            std::ffi::OsStr::to_os_string,
        );
        name.push(".lock");
        self.path.with_file_name(name)
    }
}
