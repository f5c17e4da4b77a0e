// crates/skill-gate-pipeline/src/queue_io.rs
// ============================================================================
// Module: Work Queue Store
// Description: Queue file persistence with atomic saves.
// Purpose: Load and rewrite the queue document durably.
// Dependencies: serde_json, skill-gate-core, tempfile, thiserror
// ============================================================================

//! ## Overview
//! The queue file is canonical JSON. A missing file loads as the empty
//! queue; an unreadable or undecodable file is corruption and fails the
//! operation. Saves follow the registry discipline: temp file in the same
//! directory, then an atomic rename, refreshing `updated_at`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use skill_gate_core::Timestamp;
use skill_gate_core::WorkQueue;
use tempfile::NamedTempFile;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Queue persistence errors.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Filesystem operation failed.
    #[error("queue I/O failed at {path}: {detail}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// I/O diagnostic detail.
        detail: String,
    },
    /// The queue file exists but cannot be decoded.
    #[error("queue file corrupt at {path}: {detail}")]
    Corrupt {
        /// Offending path.
        path: PathBuf,
        /// Decoder diagnostic detail.
        detail: String,
    },
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// File-backed work queue store.
#[derive(Debug, Clone)]
pub struct QueueStore {
    /// Queue document path.
    path: PathBuf,
}

impl QueueStore {
    /// Creates a store over the given queue path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the queue document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the queue; a missing file is the empty queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Corrupt`] when the file exists but cannot be
    /// decoded, and [`QueueError::Io`] on read failures.
    pub fn load(&self) -> Result<WorkQueue, QueueError> {
        if !self.path.exists() {
            return Ok(WorkQueue::empty(Timestamp::now()));
        }
        let text = std::fs::read_to_string(&self.path).map_err(|err| QueueError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|err| QueueError::Corrupt {
            path: self.path.clone(),
            detail: err.to_string(),
        })
    }

    /// Saves the queue atomically, refreshing `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] when the temp file cannot be written or
    /// renamed into place.
    pub fn save(&self, queue: &mut WorkQueue) -> Result<(), QueueError> {
        queue.updated_at = Timestamp::now();

        let parent = self.path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        std::fs::create_dir_all(&parent).map_err(|err| QueueError::Io {
            path: parent.clone(),
            detail: err.to_string(),
        })?;

        let mut encoded = serde_json::to_vec_pretty(queue).map_err(|err| QueueError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        })?;
        encoded.push(b'\n');

        let mut temp = NamedTempFile::new_in(&parent).map_err(|err| QueueError::Io {
            path: parent.clone(),
            detail: err.to_string(),
        })?;
        temp.write_all(&encoded).map_err(|err| QueueError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        })?;
        temp.persist(&self.path).map_err(|err| QueueError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        })?;
        Ok(())
    }
}
