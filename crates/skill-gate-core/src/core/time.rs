// crates/skill-gate-core/src/core/time.rs
// ============================================================================
// Module: Skill Gate Time Model
// Description: Canonical UTC timestamps for registry, queue, and audit records.
// Purpose: Provide deterministic second-precision time values with stable wire forms.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Every persisted Skill Gate record carries UTC timestamps serialized as
//! `YYYY-MM-DDTHH:MM:SSZ`. Values are truncated to whole seconds at
//! construction so a value always round-trips bit-for-bit through its wire
//! form. Parsing accepts any RFC 3339 timestamp and normalizes it to UTC.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use thiserror::Error;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp parsing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum TimestampError {
    /// Input is not a valid RFC 3339 timestamp.
    #[error("invalid timestamp {input:?}: {detail}")]
    Parse {
        /// The rejected input text.
        input: String,
        /// Parser diagnostic detail.
        detail: String,
    },
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical UTC timestamp with second precision.
///
/// # Invariants
/// - Always UTC; sub-second precision is truncated at construction.
/// - The wire form is `YYYY-MM-DDTHH:MM:SSZ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Returns the current wall-clock time, truncated to whole seconds.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(OffsetDateTime::now_utc())
    }

    /// Builds a timestamp from an arbitrary datetime, normalizing to UTC
    /// second precision.
    #[must_use]
    pub fn from_datetime(value: OffsetDateTime) -> Self {
        let utc = value.to_offset(UtcOffset::UTC);
        Self(utc.replace_nanosecond(0).unwrap_or(utc))
    }

    /// Builds a timestamp from unix seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the value is outside the representable
    /// datetime range.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, TimestampError> {
        OffsetDateTime::from_unix_timestamp(seconds).map(Self::from_datetime).map_err(|err| {
            TimestampError::Parse {
                input: seconds.to_string(),
                detail: err.to_string(),
            }
        })
    }

    /// Parses an RFC 3339 timestamp, normalizing to UTC second precision.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the input is not valid RFC 3339.
    pub fn parse(input: &str) -> Result<Self, TimestampError> {
        OffsetDateTime::parse(input, &Rfc3339).map(Self::from_datetime).map_err(|err| {
            TimestampError::Parse {
                input: input.to_string(),
                detail: err.to_string(),
            }
        })
    }

    /// Returns the unix seconds value.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Renders the canonical `YYYY-MM-DDTHH:MM:SSZ` wire form.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(DeError::custom)
    }
}
