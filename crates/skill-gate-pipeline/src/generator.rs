// crates/skill-gate-pipeline/src/generator.rs
// ============================================================================
// Module: Mock Skill Generator
// Description: Keyword-triggered canned skill packages for offline runs.
// Purpose: Provide a deterministic generator for tests and dry pipelines.
// Dependencies: serde_json, skill-gate-core
// ============================================================================

//! ## Overview
//! The mock generator returns predefined skill packages selected by keyword
//! matching over the capability description. Every canned artifact uses only
//! allowlisted imports so it passes the static gate, declares no elevated
//! permissions, and self-verifies deterministically. Unknown capabilities
//! produce the typed `UnknownCapability` error the controller downgrades to
//! a per-item failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::json;
use skill_gate_core::GenerateError;
use skill_gate_core::SkillGenerator;
use skill_gate_core::SkillName;
use skill_gate_core::SkillPackage;

// ============================================================================
// SECTION: Trigger Keywords
// ============================================================================

/// Keywords selecting the text echo skill.
const TEXT_ECHO_TRIGGERS: &[&str] = &["echo", "text", "uppercase", "convert", "lowercase", "case"];

/// Keywords selecting the filename normalization skill.
const FILENAME_TRIGGERS: &[&str] = &["filename", "normalize", "sanitize", "safe"];

// ============================================================================
// SECTION: Canned Sources
// ============================================================================

/// Source of the text echo skill.
const TEXT_ECHO_CODE: &str = r#""""Echo text back with optional case conversion."""


def action(text, mode="upper"):
    if mode == "upper":
        result = text.upper()
    elif mode == "lower":
        result = text.lower()
    else:
        result = text
    return {"result": result}


def verify():
    if action("abc")["result"] != "ABC":
        return False
    if action("ABC", mode="lower")["result"] != "abc":
        return False
    if action("MiXeD", mode="keep")["result"] != "MiXeD":
        return False
    return True
"#;

/// Source of the filename normalization skill.
const FILENAME_NORMALIZE_CODE: &str = r#""""Normalize arbitrary text into a safe filename token."""
import re


def action(filename):
    cleaned = re.sub(r"[^a-zA-Z0-9._-]+", "_", filename.strip())
    cleaned = re.sub(r"_+", "_", cleaned).strip("._")
    return {"result": cleaned.lower() or "unnamed"}


def verify():
    if action("My Report.PDF")["result"] != "my_report.pdf":
        return False
    if action("???")["result"] != "unnamed":
        return False
    return True
"#;

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Deterministic keyword-matching generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGenerator;

impl MockGenerator {
    /// Creates the mock generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the text echo package.
    fn text_echo() -> Result<SkillPackage, GenerateError> {
        Ok(SkillPackage {
            name: skill_name("text_echo")?,
            code: TEXT_ECHO_CODE.to_string(),
            manifest: json!({
                "name": "text_echo",
                "version": "1.0.0",
                "description": "Echo text back with optional upper or lower case conversion.",
                "inputs_schema": {
                    "type": "object",
                    "properties": {
                        "text": {"type": "string"},
                        "mode": {"type": "string", "enum": ["upper", "lower", "keep"]}
                    },
                    "required": ["text"]
                },
                "outputs_schema": {
                    "type": "object",
                    "properties": {"result": {"type": "string"}},
                    "required": ["result"]
                },
                "permissions": {"filesystem": "none", "network": false, "subprocess": false},
                "tags": ["text", "echo"]
            }),
            tests: vec![json!({
                "id": "text_echo-replay-001",
                "skill": "text_echo",
                "input": {"text": "hello"},
                "expected": {"type": "exact", "value": {"result": "HELLO"}},
                "timeout_ms": 2000
            })],
        })
    }

    /// Builds the filename normalization package.
    fn filename_normalize() -> Result<SkillPackage, GenerateError> {
        Ok(SkillPackage {
            name: skill_name("filename_normalize")?,
            code: FILENAME_NORMALIZE_CODE.to_string(),
            manifest: json!({
                "name": "filename_normalize",
                "version": "1.0.0",
                "description": "Normalize arbitrary text into a lowercase filesystem-safe token.",
                "inputs_schema": {
                    "type": "object",
                    "properties": {"filename": {"type": "string"}},
                    "required": ["filename"]
                },
                "outputs_schema": {
                    "type": "object",
                    "properties": {"result": {"type": "string"}},
                    "required": ["result"]
                },
                "permissions": {"filesystem": "none", "network": false, "subprocess": false},
                "tags": ["filename", "sanitize"]
            }),
            tests: vec![json!({
                "id": "filename_normalize-replay-001",
                "skill": "filename_normalize",
                "input": {"filename": "My Report.PDF"},
                "expected": {"type": "exact", "value": {"result": "my_report.pdf"}},
                "timeout_ms": 2000
            })],
        })
    }
}

impl SkillGenerator for MockGenerator {
    fn generate_skill(
        &self,
        capability: &str,
        _context: &str,
    ) -> Result<SkillPackage, GenerateError> {
        let lowered = capability.to_lowercase();
        if TEXT_ECHO_TRIGGERS.iter().any(|t| lowered.contains(t)) {
            return Self::text_echo();
        }
        if FILENAME_TRIGGERS.iter().any(|t| lowered.contains(t)) {
            return Self::filename_normalize();
        }
        Err(GenerateError::UnknownCapability(capability.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a skill name for a canned package.
fn skill_name(name: &str) -> Result<SkillName, GenerateError> {
    SkillName::new(name).map_err(|err| GenerateError::Provider(err.to_string()))
}
