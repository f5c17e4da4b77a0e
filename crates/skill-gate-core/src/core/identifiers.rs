// crates/skill-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Skill Gate Identifiers
// Description: Canonical opaque identifiers for skills, versions, and queue items.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Skill Gate.
//! Skill names and version strings enforce their grammar at construction
//! boundaries so downstream code never re-validates. Queue item identifiers
//! are opaque.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum length of a skill name.
const NAME_MIN_LENGTH: usize = 3;
/// Maximum length of a skill name.
const NAME_MAX_LENGTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Skill name validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    /// Name is outside the 3..=64 length bounds.
    #[error("skill name length {0} outside 3..=64")]
    Length(usize),
    /// Name does not start with a lowercase ASCII letter.
    #[error("skill name must start with a lowercase letter")]
    Start,
    /// Name contains a character outside `[a-z0-9_]`.
    #[error("skill name contains invalid character {0:?}")]
    Character(char),
}

/// Version string validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    /// Version is not three dot-separated numeric components.
    #[error("version {0:?} is not MAJOR.MINOR.PATCH")]
    Shape(String),
}

// ============================================================================
// SECTION: Skill Name
// ============================================================================

/// Validated skill name.
///
/// # Invariants
/// - Matches `^[a-z][a-z0-9_]{2,63}$`; validated at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct SkillName(String);

impl SkillName {
    /// Creates a skill name, validating the grammar.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] when the name violates the length or character
    /// grammar.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        if name.len() < NAME_MIN_LENGTH || name.len() > NAME_MAX_LENGTH {
            return Err(NameError::Length(name.len()));
        }
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_lowercase() => {}
            _ => return Err(NameError::Start),
        }
        for ch in chars {
            if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_') {
                return Err(NameError::Character(ch));
            }
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SkillName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for SkillName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Version Identifier
// ============================================================================

/// Validated `MAJOR.MINOR.PATCH` version string.
///
/// # Invariants
/// - Matches `^\d+\.\d+\.\d+$`; validated at construction.
/// - Ordering is lexicographic over the raw string; the registry never orders
///   versions semantically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct VersionId(String);

impl VersionId {
    /// Creates a version identifier, validating the triple grammar.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] when the string is not three dot-separated
    /// non-empty runs of ASCII digits.
    pub fn new(version: impl Into<String>) -> Result<Self, VersionError> {
        let version = version.into();
        let mut components = 0usize;
        for component in version.split('.') {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::Shape(version));
            }
            components += 1;
        }
        if components != 3 {
            return Err(VersionError::Shape(version));
        }
        Ok(Self(version))
    }

    /// Returns the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VersionId {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Queue Item Identifier
// ============================================================================

/// Opaque queue item identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates a new item identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
