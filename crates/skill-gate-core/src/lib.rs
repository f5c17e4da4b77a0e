// crates/skill-gate-core/src/lib.rs
// ============================================================================
// Module: Skill Gate Core
// Description: Data model, hashing, and collaborator interfaces for Skill Gate.
// Purpose: Define the canonical types shared by every pipeline stage.
// Dependencies: jsonschema, serde, serde_jcs, serde_json, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Skill Gate governs the lifecycle of machine-generated skill artifacts:
//! ingestion, layered validation, staging, promotion, and rollback. This crate
//! defines the shared data model (identifiers, manifests, registry and queue
//! records), canonical hashing, and the backend-agnostic interfaces the
//! pipeline crates implement.
//!
//! Invariants:
//! - Wire forms are deterministic; maps are ordered and timestamps are UTC
//!   second-precision ISO-8601 with a trailing `Z`.
//! - Identifier validation happens at construction boundaries; downstream code
//!   may assume well-formed names and versions.
//!
//! Security posture: all artifact inputs are untrusted and fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::hashing;
pub use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
pub use crate::core::hashing::HashAlgorithm;
pub use crate::core::hashing::HashDigest;
pub use crate::core::hashing::HashError;
pub use crate::core::identifiers::ItemId;
pub use crate::core::identifiers::NameError;
pub use crate::core::identifiers::SkillName;
pub use crate::core::identifiers::VersionError;
pub use crate::core::identifiers::VersionId;
pub use crate::core::manifest::Dependency;
pub use crate::core::manifest::ExampleRecord;
pub use crate::core::manifest::FilesystemScope;
pub use crate::core::manifest::ManifestReport;
pub use crate::core::manifest::ManifestValidator;
pub use crate::core::manifest::Permissions;
pub use crate::core::manifest::SchemaError;
pub use crate::core::manifest::SkillManifest;
pub use crate::core::manifest::manifest_schema;
pub use crate::core::queue::ItemStatus;
pub use crate::core::queue::QueueItem;
pub use crate::core::queue::WorkQueue;
pub use crate::core::queue::dedup_key;
pub use crate::core::registry::AstGateRecord;
pub use crate::core::registry::GateCategory;
pub use crate::core::registry::GateCategoryError;
pub use crate::core::registry::GateOutcomeRecord;
pub use crate::core::registry::RegistryData;
pub use crate::core::registry::SandboxRecord;
pub use crate::core::registry::SkillEntry;
pub use crate::core::registry::SkillVersion;
pub use crate::core::registry::ValidationRecord;
pub use crate::core::registry::VersionStatus;
pub use crate::core::time::Timestamp;
pub use crate::core::time::TimestampError;
pub use crate::interfaces::ActionOutcome;
pub use crate::interfaces::ArtifactBackend;
pub use crate::interfaces::ArtifactSymbols;
pub use crate::interfaces::BackendError;
pub use crate::interfaces::GenerateError;
pub use crate::interfaces::RunMetrics;
pub use crate::interfaces::SandboxDecision;
pub use crate::interfaces::SandboxExecutor;
pub use crate::interfaces::SkillGenerator;
pub use crate::interfaces::SkillPackage;
pub use crate::interfaces::VerifyOutcome;
