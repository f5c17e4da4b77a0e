// crates/skill-gate-eval/src/cases.rs
// ============================================================================
// Module: Evaluation Case Loader
// Description: Case records and category directory discovery.
// Purpose: Load the cases targeting one skill from a category directory.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Cases live as one JSON file each under `<eval_dir>/<category>/`. The
//! loader skips dot-files, decodes every remaining `.json` file, and keeps
//! the cases whose `skill` field matches the skill under test. A missing
//! category directory is an empty case set; an unreadable or undecodable
//! case file is a data-corruption error and is never skipped silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Evaluation data errors.
///
/// # Invariants
/// - Variants indicate data corruption and are fatal to the gate run.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A case directory or file could not be read.
    #[error("failed to read eval case data at {path}: {detail}")]
    CaseRead {
        /// Offending path.
        path: PathBuf,
        /// I/O diagnostic detail.
        detail: String,
    },
    /// A case file is not valid case JSON.
    #[error("failed to decode eval case {path}: {detail}")]
    CaseDecode {
        /// Offending path.
        path: PathBuf,
        /// Decoder diagnostic detail.
        detail: String,
    },
}

// ============================================================================
// SECTION: Case Record
// ============================================================================

/// Default per-case timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// One evaluation case.
///
/// # Invariants
/// - `expected` stays raw JSON; its `type` tag is interpreted at evaluation
///   time so an unknown matcher fails only its own case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    /// Case identifier.
    pub id: String,
    /// Skill this case targets.
    pub skill: String,
    /// Named arguments for the action invocation.
    #[serde(default)]
    pub input: Map<String, Value>,
    /// Expected outcome specification.
    pub expected: Value,
    /// Wall-clock cap for the invocation in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Returns the default case timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Loads every case in a category directory targeting `skill_name`.
///
/// # Errors
///
/// Returns [`EvalError`] when a case file exists but cannot be read or
/// decoded. A missing category directory yields an empty set.
pub fn load_cases(
    eval_dir: &Path,
    category: &str,
    skill_name: &str,
) -> Result<Vec<EvalCase>, EvalError> {
    let category_dir = eval_dir.join(category);
    if !category_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(&category_dir).map_err(|err| EvalError::CaseRead {
        path: category_dir.clone(),
        detail: err.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| EvalError::CaseRead {
            path: category_dir.clone(),
            detail: err.to_string(),
        })?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') || !file_name.ends_with(".json") {
            continue;
        }
        paths.push(path);
    }
    paths.sort();

    let mut cases = Vec::new();
    for path in paths {
        let text = std::fs::read_to_string(&path).map_err(|err| EvalError::CaseRead {
            path: path.clone(),
            detail: err.to_string(),
        })?;
        let case: EvalCase =
            serde_json::from_str(&text).map_err(|err| EvalError::CaseDecode {
                path: path.clone(),
                detail: err.to_string(),
            })?;
        if case.skill == skill_name {
            cases.push(case);
        }
    }
    Ok(cases)
}
