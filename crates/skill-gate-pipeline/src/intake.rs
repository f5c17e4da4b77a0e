// crates/skill-gate-pipeline/src/intake.rs
// ============================================================================
// Module: Day Log Intake
// Description: MISSING-tag extraction and deduplicated queue merge.
// Purpose: Turn observed capability gaps into pending queue items.
// Dependencies: regex, skill-gate-core, thiserror, uuid
// ============================================================================

//! ## Overview
//! Day logs carry `[MISSING: <capability>]` tags wherever the runtime hit a
//! capability gap. Intake extracts every tag with its originating line,
//! then merges into the queue with case-insensitive trimmed deduplication:
//! existing items keep their id and status and gain an occurrence per
//! re-observation; within one batch the first-seen spelling wins; new items
//! enter `pending`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use regex::Regex;
use skill_gate_core::ItemId;
use skill_gate_core::ItemStatus;
use skill_gate_core::QueueItem;
use skill_gate_core::Timestamp;
use skill_gate_core::WorkQueue;
use skill_gate_core::dedup_key;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Intake errors.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The day log could not be read.
    #[error("failed to read log {path}: {detail}")]
    Read {
        /// Log path.
        path: PathBuf,
        /// I/O diagnostic detail.
        detail: String,
    },
    /// The extraction pattern failed to compile.
    #[error("intake pattern failed to compile: {0}")]
    Pattern(String),
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extraction pattern for capability gap tags.
const MISSING_PATTERN: &str = r"\[MISSING:\s*(.+?)\]";

/// Extracts `(capability, context_line)` pairs from a day log.
///
/// # Errors
///
/// Returns [`IntakeError::Read`] when the log cannot be read.
pub fn parse_log(log_path: &Path) -> Result<Vec<(String, String)>, IntakeError> {
    let pattern =
        Regex::new(MISSING_PATTERN).map_err(|err| IntakeError::Pattern(err.to_string()))?;
    let text = std::fs::read_to_string(log_path).map_err(|err| IntakeError::Read {
        path: log_path.to_path_buf(),
        detail: err.to_string(),
    })?;

    let mut results = Vec::new();
    for line in text.lines() {
        if let Some(captures) = pattern.captures(line)
            && let Some(capability) = captures.get(1)
        {
            results.push((capability.as_str().trim().to_string(), line.trim().to_string()));
        }
    }
    Ok(results)
}

// ============================================================================
// SECTION: Queue Merge
// ============================================================================

/// Merges extracted capabilities into the queue with deduplication.
///
/// Existing items keep their id and status; occurrences increment per
/// re-observation. Within one batch, the first occurrence's spelling wins.
/// Item order is existing items first, then new items in first-seen order.
#[must_use]
pub fn build_queue(capabilities: &[(String, String)], existing: Option<WorkQueue>) -> WorkQueue {
    let mut items: Vec<QueueItem> = existing.map(|queue| queue.items).unwrap_or_default();
    let mut index: HashMap<String, usize> =
        items.iter().enumerate().map(|(i, item)| (item.dedup_key(), i)).collect();

    for (capability, context) in capabilities {
        let key = dedup_key(capability);
        if let Some(&position) = index.get(&key) {
            items[position].occurrences = items[position].occurrences.saturating_add(1);
            continue;
        }
        let item = QueueItem {
            id: ItemId::new(Uuid::new_v4().to_string()),
            capability: capability.trim().to_string(),
            first_seen: Timestamp::now(),
            occurrences: 1,
            context: context.clone(),
            status: ItemStatus::Pending,
        };
        index.insert(key, items.len());
        items.push(item);
    }

    WorkQueue {
        items,
        updated_at: Timestamp::now(),
    }
}
