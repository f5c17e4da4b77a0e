// crates/skill-gate-core/src/core/hashing.rs
// ============================================================================
// Module: Skill Gate Canonical Hashing
// Description: SHA-256 digests over raw bytes and canonical JSON encodings.
// Purpose: Provide deterministic content hashes for code and manifests.
// Dependencies: serde, serde_jcs, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! Registry entries bind artifact content by hash: skill code is hashed over
//! its UTF-8 bytes, manifests over their RFC 8785 canonical JSON encoding
//! (sorted keys, no extraneous whitespace). Equal digests therefore imply
//! bit-for-bit equal canonical content.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Algorithm Selection
// ============================================================================

/// Default hash algorithm for all Skill Gate digests.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Supported hash algorithms.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Canonical hashing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HashError {
    /// Canonical JSON encoding failed (for example non-finite floats).
    #[error("canonical JSON encoding failed: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Digest
// ============================================================================

/// Hash digest with its producing algorithm.
///
/// # Invariants
/// - `value` is lowercase hex of the digest bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Algorithm that produced the digest.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest value.
    pub value: String,
}

impl HashDigest {
    /// Returns the hex digest value.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.value
    }

    /// Consumes the digest, returning the hex value.
    #[must_use]
    pub fn into_hex(self) -> String {
        self.value
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ============================================================================
// SECTION: Hashing Functions
// ============================================================================

/// Hashes raw bytes with the given algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    let HashAlgorithm::Sha256 = algorithm;
    let digest = Sha256::digest(bytes);
    let mut value = String::with_capacity(digest.len() * 2);
    for byte in digest {
        value.push_str(&format!("{byte:02x}"));
    }
    HashDigest {
        algorithm,
        value,
    }
}

/// Encodes a value as RFC 8785 canonical JSON bytes.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the value cannot be encoded
/// canonically (for example `NaN` or infinite floats).
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes the canonical JSON encoding of a value.
///
/// # Errors
///
/// Returns [`HashError`] when canonical encoding fails.
pub fn hash_canonical_json<T: Serialize>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}
