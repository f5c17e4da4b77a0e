// crates/skill-gate-core/src/core/queue.rs
// ============================================================================
// Module: Capability Work Queue Model
// Description: Pending capability requests awaiting evolution.
// Purpose: Model queue items with a terminal-state lifecycle.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! The work queue records capability gaps observed in day logs. Items enter
//! `pending`, move to `processing` when the controller dequeues them, and end
//! terminally as `completed` or `failed`; a terminal item is never revived.
//! Deduplication is keyed on the lowercased, trimmed capability text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ItemId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Item Status
// ============================================================================

/// Queue item lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Awaiting processing.
    #[default]
    Pending,
    /// Currently being driven through the pipeline.
    Processing,
    /// Terminally succeeded; a staging version exists.
    Completed,
    /// Terminally failed at some gate.
    Failed,
}

impl ItemStatus {
    /// Returns true for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ============================================================================
// SECTION: Queue Item
// ============================================================================

/// A single capability request in the work queue.
///
/// # Invariants
/// - `occurrences >= 1`.
/// - `capability` keeps the first-seen spelling; re-observations only
///   increment `occurrences`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Stable opaque identifier.
    pub id: ItemId,
    /// Natural-language capability description (first-seen spelling).
    pub capability: String,
    /// First observation timestamp.
    pub first_seen: Timestamp,
    /// Number of observations.
    pub occurrences: u32,
    /// Originating log line.
    #[serde(default)]
    pub context: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ItemStatus,
}

impl QueueItem {
    /// Returns the case-insensitive dedup key for this item.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.capability)
    }
}

/// Computes the dedup key for a capability description.
#[must_use]
pub fn dedup_key(capability: &str) -> String {
    capability.trim().to_lowercase()
}

// ============================================================================
// SECTION: Work Queue
// ============================================================================

/// The on-disk work queue.
///
/// # Invariants
/// - Item order is preserved across merges; existing items precede new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkQueue {
    /// Queue items in stable order.
    pub items: Vec<QueueItem>,
    /// Last-save timestamp.
    pub updated_at: Timestamp,
}

impl WorkQueue {
    /// Creates an empty queue stamped with the given time.
    #[must_use]
    pub const fn empty(updated_at: Timestamp) -> Self {
        Self {
            items: Vec::new(),
            updated_at,
        }
    }

    /// Counts items currently in `pending` state.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|item| item.status == ItemStatus::Pending).count()
    }
}
