// crates/skill-gate-policy/src/tables.rs
// ============================================================================
// Module: Static Policy Tables
// Description: Allowed modules, forbidden calls/attributes, suspicious patterns.
// Purpose: Keep the security policy as loadable data with safe defaults.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The policy tables are the single source of the gate's deny rules. The
//! defaults cover the complete MVP policy; a deployment can replace or
//! extend them from a JSON artifact without recompiling. Fields omitted from
//! a loaded artifact keep their defaults.
//!
//! The module allowlist admits only computation-local capability: codecs,
//! string and regex processing, typed paths, date/time, type hints,
//! collections, numerics, hashing, binary encodings, URL parsing, and
//! context-management helpers. Nothing that performs I/O, networking,
//! process control, dynamic loading, or operating-system access.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Default Tables
// ============================================================================

/// Top-level modules importable by generated skills.
const ALLOWED_TOP_LEVEL_MODULES: &[&str] = &[
    // Data formats
    "json", "csv", "xml",
    // String and regex
    "re", "string", "textwrap",
    // Typed paths (safe usage)
    "pathlib",
    // Date and time
    "datetime", "time", "calendar",
    // Type hints and shapes
    "typing", "types", "dataclasses", "enum",
    // Collections and iteration
    "collections", "itertools", "functools",
    // Numerics
    "math", "decimal", "fractions", "statistics", "random",
    // Hashing and binary encodings
    "hashlib", "base64", "binascii",
    // URL parsing (parse-only)
    "urllib",
    // Utilities
    "copy", "pprint", "operator",
    // Context management
    "contextlib",
    // Abstract base classes
    "abc",
];

/// Function names whose call sites are rejected.
const FORBIDDEN_CALLS: &[&str] = &[
    // Dynamic execution
    "__import__", "eval", "exec", "compile",
    // Direct I/O
    "open", "input",
    // Reflection bypass routes
    "getattr", "setattr", "delattr",
    // Scope access
    "globals", "locals", "vars",
    // Debugger entry
    "breakpoint",
];

/// Attribute names whose access is rejected.
const FORBIDDEN_ATTRIBUTES: &[&str] = &[
    // Type-lattice escapes
    "__subclasses__", "__bases__", "__mro__",
    // Code objects
    "__globals__", "__code__", "__closure__",
    // Builtins and import machinery
    "__builtins__", "__import__",
    // Module loading
    "__loader__", "__spec__",
];

/// Regex patterns indicating dangerous intent in raw source text.
const SUSPICIOUS_PATTERNS: &[&str] = &[
    // POSIX path traversal
    r"\.\./",
    // Windows path traversal
    r"\.\.\\",
    // System directories
    r"/etc/",
    r"/proc/",
    r"/sys/",
    // User home expansion
    r"~/",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy table errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A policy artifact could not be read.
    #[error("failed to read policy artifact {path}: {detail}")]
    Read {
        /// Artifact path.
        path: String,
        /// I/O diagnostic detail.
        detail: String,
    },
    /// A policy artifact could not be decoded.
    #[error("failed to decode policy artifact: {0}")]
    Decode(String),
    /// A suspicious pattern failed to compile.
    #[error("suspicious pattern {pattern:?} failed to compile: {detail}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Compiler diagnostic detail.
        detail: String,
    },
    /// The analyzer grammar could not be loaded.
    #[error("analyzer grammar unavailable: {0}")]
    Grammar(String),
}

// ============================================================================
// SECTION: Policy Tables
// ============================================================================

/// Loadable static policy tables.
///
/// # Invariants
/// - Sets are deny-by-default: anything outside `allowed_modules` is a
///   violation; anything inside the forbidden sets is a violation.
/// - Pattern validity is checked by [`crate::StaticGate::new`], not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTables {
    /// Top-level modules importable by skills.
    #[serde(default = "default_allowed_modules")]
    pub allowed_modules: BTreeSet<String>,
    /// Function names whose call sites are rejected.
    #[serde(default = "default_forbidden_calls")]
    pub forbidden_calls: BTreeSet<String>,
    /// Attribute names whose access is rejected.
    #[serde(default = "default_forbidden_attributes")]
    pub forbidden_attributes: BTreeSet<String>,
    /// Regex patterns scanned over the raw source text.
    #[serde(default = "default_suspicious_patterns")]
    pub suspicious_patterns: Vec<String>,
}

impl Default for PolicyTables {
    fn default() -> Self {
        Self {
            allowed_modules: default_allowed_modules(),
            forbidden_calls: default_forbidden_calls(),
            forbidden_attributes: default_forbidden_attributes(),
            suspicious_patterns: default_suspicious_patterns(),
        }
    }
}

impl PolicyTables {
    /// Loads tables from a JSON value; omitted fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Decode`] when the value does not match the
    /// table shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PolicyError> {
        serde_json::from_value(value).map_err(|err| PolicyError::Decode(err.to_string()))
    }

    /// Loads tables from a JSON artifact on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Read`] when the file cannot be read and
    /// [`PolicyError::Decode`] when its content does not match the table
    /// shape.
    pub fn from_path(path: &Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path).map_err(|err| PolicyError::Read {
            path: path.display().to_string(),
            detail: err.to_string(),
        })?;
        let value =
            serde_json::from_str(&text).map_err(|err| PolicyError::Decode(err.to_string()))?;
        Self::from_value(value)
    }
}

// ============================================================================
// SECTION: Default Constructors
// ============================================================================

/// Builds the default module allowlist.
fn default_allowed_modules() -> BTreeSet<String> {
    ALLOWED_TOP_LEVEL_MODULES.iter().map(ToString::to_string).collect()
}

/// Builds the default forbidden call set.
fn default_forbidden_calls() -> BTreeSet<String> {
    FORBIDDEN_CALLS.iter().map(ToString::to_string).collect()
}

/// Builds the default forbidden attribute set.
fn default_forbidden_attributes() -> BTreeSet<String> {
    FORBIDDEN_ATTRIBUTES.iter().map(ToString::to_string).collect()
}

/// Builds the default suspicious pattern list.
fn default_suspicious_patterns() -> Vec<String> {
    SUSPICIOUS_PATTERNS.iter().map(ToString::to_string).collect()
}
