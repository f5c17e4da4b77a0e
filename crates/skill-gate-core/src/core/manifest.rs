// crates/skill-gate-core/src/core/manifest.rs
// ============================================================================
// Module: Skill Manifest Model & Validation
// Description: Manifest schema, typed manifest records, and policy validation.
// Purpose: Accept only closed, well-formed manifests that satisfy MVP policy.
// Dependencies: jsonschema, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every skill artifact carries a `skill.json` manifest. Validation is two
//! layered checks over the raw JSON value: a closed Draft 2020-12 schema
//! (unknown keys at the root or inside `permissions` are rejections), then
//! the MVP permission policy (`network` and `subprocess` must be `false`).
//! All violations are accumulated into one report so a rejected generator
//! run can be debugged from a single audit entry.
//!
//! Security posture: manifests are untrusted generator output; validation
//! fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonschema::Draft;
use jsonschema::Validator;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Manifest schema compilation errors.
///
/// # Invariants
/// - Raised only for programming or packaging defects, never for bad input;
///   bad input is reported through [`ManifestReport`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The embedded schema failed to compile.
    #[error("manifest schema failed to compile: {0}")]
    Compile(String),
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the embedded skill manifest schema (Draft 2020-12).
///
/// The schema is a closed object: any key outside the declared set, at the
/// top level or inside `permissions`, fails validation.
#[must_use]
pub fn manifest_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Skill manifest",
        "type": "object",
        "additionalProperties": false,
        "required": [
            "name",
            "version",
            "description",
            "inputs_schema",
            "outputs_schema",
            "permissions"
        ],
        "properties": {
            "name": {
                "type": "string",
                "pattern": "^[a-z][a-z0-9_]{2,63}$"
            },
            "version": {
                "type": "string",
                "pattern": "^[0-9]+\\.[0-9]+\\.[0-9]+$"
            },
            "description": {
                "type": "string",
                "minLength": 10,
                "maxLength": 500
            },
            "author": {
                "type": "string"
            },
            "created_at": {
                "type": ["string", "null"]
            },
            "inputs_schema": {
                "type": "object"
            },
            "outputs_schema": {
                "type": "object"
            },
            "permissions": {
                "type": "object",
                "additionalProperties": false,
                "required": ["filesystem", "network", "subprocess"],
                "properties": {
                    "filesystem": {
                        "enum": ["none", "read_workdir", "write_workdir"]
                    },
                    "network": {
                        "type": "boolean"
                    },
                    "subprocess": {
                        "type": "boolean"
                    }
                }
            },
            "dependencies": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["name", "version"],
                    "properties": {
                        "name": { "type": "string" },
                        "version": { "type": "string" }
                    }
                }
            },
            "tags": {
                "type": "array",
                "items": { "type": "string" }
            },
            "examples": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["input", "output"],
                    "properties": {
                        "description": { "type": ["string", "null"] },
                        "input": { "type": "object" },
                        "output": {}
                    }
                }
            }
        }
    })
}

// ============================================================================
// SECTION: Typed Manifest
// ============================================================================

/// Filesystem permission scope declared by a manifest.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilesystemScope {
    /// No filesystem access.
    #[default]
    None,
    /// Read-only access to the working directory.
    ReadWorkdir,
    /// Read-write access to the working directory.
    WriteWorkdir,
}

/// Permission declaration carried by a manifest.
///
/// # Invariants
/// - MVP policy requires `network == false` and `subprocess == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Permissions {
    /// Filesystem scope.
    pub filesystem: FilesystemScope,
    /// Network access flag.
    pub network: bool,
    /// Subprocess spawn flag.
    pub subprocess: bool,
}

/// Declared package dependency.
///
/// # Invariants
/// - Informational only; the sandbox image controls what is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    /// Package name.
    pub name: String,
    /// Version requirement.
    pub version: String,
}

/// Usage example carried by a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExampleRecord {
    /// Optional human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example action input.
    pub input: Value,
    /// Example action output.
    pub output: Value,
}

/// Typed skill manifest.
///
/// # Invariants
/// - Construct only from JSON that already passed [`ManifestValidator`];
///   deserialization re-checks closedness but not policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillManifest {
    /// Skill name token.
    pub name: String,
    /// Semantic version triple.
    pub version: String,
    /// Human description (10..=500 characters).
    pub description: String,
    /// Author attribution.
    #[serde(default = "default_author")]
    pub author: String,
    /// Optional creation timestamp text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// JSON schema for action inputs.
    pub inputs_schema: Value,
    /// JSON schema for action outputs.
    pub outputs_schema: Value,
    /// Permission declaration.
    pub permissions: Permissions,
    /// Declared dependencies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    /// Search tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Usage examples.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ExampleRecord>,
}

/// Default author attribution for generated manifests.
fn default_author() -> String {
    "auto-generated".to_string()
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Accumulated manifest validation outcome.
///
/// # Invariants
/// - `valid` is true if and only if `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestReport {
    /// Whether the manifest passed every check.
    pub valid: bool,
    /// Every schema and policy violation found.
    pub errors: Vec<String>,
}

/// Manifest validator with a compiled schema.
///
/// # Invariants
/// - Schema checks and MVP policy checks are both applied; policy violations
///   are rejections even when the schema passes.
pub struct ManifestValidator {
    /// Compiled manifest schema.
    validator: Validator,
    /// Whether MVP permission constraints are enforced.
    enforce_mvp_constraints: bool,
}

impl ManifestValidator {
    /// Builds a validator that enforces MVP permission constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the embedded schema fails to compile.
    pub fn new() -> Result<Self, SchemaError> {
        Self::with_options(true)
    }

    /// Builds a validator with explicit MVP enforcement selection.
    ///
    /// Disabling enforcement is for offline inspection tooling only; the
    /// pipeline always enforces.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the embedded schema fails to compile.
    pub fn with_options(enforce_mvp_constraints: bool) -> Result<Self, SchemaError> {
        let schema = manifest_schema();
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .map_err(|err| SchemaError::Compile(err.to_string()))?;
        Ok(Self {
            validator,
            enforce_mvp_constraints,
        })
    }

    /// Validates a manifest value, accumulating every violation.
    #[must_use]
    pub fn validate(&self, manifest: &Value) -> ManifestReport {
        let mut errors: Vec<String> = self
            .validator
            .iter_errors(manifest)
            .map(|err| format!("Schema validation error: {err}"))
            .collect();

        if self.enforce_mvp_constraints {
            errors.extend(check_mvp_permissions(manifest));
        }

        ManifestReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Checks the MVP permission policy on the raw manifest value.
///
/// The checks read the raw value rather than the typed manifest so policy
/// violations are reported even when the schema already failed elsewhere.
fn check_mvp_permissions(manifest: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let permissions = manifest.get("permissions");
    if permissions.and_then(|p| p.get("network")) == Some(&Value::Bool(true)) {
        errors.push("MVP constraint violation: network must be false".to_string());
    }
    if permissions.and_then(|p| p.get("subprocess")) == Some(&Value::Bool(true)) {
        errors.push("MVP constraint violation: subprocess must be false".to_string());
    }
    errors
}
