// crates/skill-gate-registry/src/audit.rs
// ============================================================================
// Module: Append-Only Audit Log
// Description: One-line-per-event lifecycle audit records.
// Purpose: Keep a tamper-evident, tail-safe trail of every pipeline event.
// Dependencies: skill-gate-core, thiserror
// ============================================================================

//! ## Overview
//! Each event renders as `<ISO8601Z> [<OPERATION>] k1=v1 k2=v2 ...` on one
//! line. Values whose rendering contains whitespace are double-quoted;
//! absent values are omitted entirely. The line is written with a single
//! append-mode syscall so concurrent writers on the same file never
//! interleave within a line, and readers may tail safely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use skill_gate_core::Timestamp;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Audit log errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The log file could not be opened or written.
    #[error("audit log write failed at {path}: {detail}")]
    Io {
        /// Log file path.
        path: PathBuf,
        /// I/O diagnostic detail.
        detail: String,
    },
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Audited lifecycle operations.
///
/// # Invariants
/// - Wire tags are stable; parsers key on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    /// Generator invoked for a queue item.
    Generate,
    /// Static gate verdict recorded.
    AstGate,
    /// Manifest validation rejected the artifact.
    ManifestInvalid,
    /// Artifact written to the staging area.
    Staging,
    /// Sandbox verdict recorded.
    Sandbox,
    /// Version promoted to prod.
    Promote,
    /// Promotion rejected by the evaluation gates.
    PromoteFailed,
    /// Prod rolled back to a prior version.
    Rollback,
    /// Version disabled.
    Disable,
    /// Generator failed for a queue item.
    GenerateFailed,
    /// Unexpected pipeline error.
    Error,
}

impl AuditOperation {
    /// Returns the stable wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "GENERATE",
            Self::AstGate => "AST_GATE",
            Self::ManifestInvalid => "MANIFEST_INVALID",
            Self::Staging => "STAGING",
            Self::Sandbox => "SANDBOX",
            Self::Promote => "PROMOTE",
            Self::PromoteFailed => "PROMOTE_FAILED",
            Self::Rollback => "ROLLBACK",
            Self::Disable => "DISABLE",
            Self::GenerateFailed => "GENERATE_FAILED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// One audit event under construction.
///
/// # Invariants
/// - Field order is preserved in the rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Operation tag.
    operation: AuditOperation,
    /// Ordered key/value fields.
    fields: Vec<(String, String)>,
}

impl AuditEvent {
    /// Starts an event for an operation.
    #[must_use]
    pub const fn new(operation: AuditOperation) -> Self {
        Self {
            operation,
            fields: Vec::new(),
        }
    }

    /// Appends a key/value field.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends a field only when the value is present.
    #[must_use]
    pub fn field_opt(self, key: &str, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    /// Renders the event line (without trailing newline) at a timestamp.
    #[must_use]
    pub fn render(&self, timestamp: Timestamp) -> String {
        let mut line = format!("{} [{}]", timestamp.to_wire(), self.operation);
        for (key, value) in &self.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            if value.chars().any(char::is_whitespace) {
                line.push('"');
                line.push_str(value);
                line.push('"');
            } else {
                line.push_str(value);
            }
        }
        line
    }
}

// ============================================================================
// SECTION: Logger
// ============================================================================

/// Append-only audit logger bound to one log file.
///
/// # Invariants
/// - Owned and threaded by reference through the pipeline; never
///   process-global, so tests isolate audit output per run.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    /// Log file path.
    path: PathBuf,
}

impl AuditLogger {
    /// Creates a logger for the given log file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Appends one event stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the log cannot be opened or written.
    pub fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.append_at(event, Timestamp::now())
    }

    /// Appends one event at an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the log cannot be opened or written.
    pub fn append_at(&self, event: &AuditEvent, timestamp: Timestamp) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AuditError::Io {
                path: self.path.clone(),
                detail: err.to_string(),
            })?;
        }

        let mut line = event.render(timestamp);
        line.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|err| AuditError::Io {
                path: self.path.clone(),
                detail: err.to_string(),
            })?;
        // One write per line keeps concurrent appends line-atomic.
        file.write_all(line.as_bytes()).map_err(|err| AuditError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        })
    }
}
