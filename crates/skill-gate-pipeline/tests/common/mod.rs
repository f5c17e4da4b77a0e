// crates/skill-gate-pipeline/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared stubs and fixtures for pipeline tests.
// Purpose: Provide generator/sandbox/backend doubles injected at the seams.
// Dependencies: skill-gate-core, skill-gate-pipeline
// ============================================================================

//! ## Overview
//! Shared fixtures for pipeline tests: a scripted generator, a scripted
//! sandbox, an echoing artifact backend, and queue/case helpers. No fixture
//! needs Docker or a Python interpreter.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::time::Duration;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use skill_gate_core::ActionOutcome;
use skill_gate_core::ArtifactBackend;
use skill_gate_core::ArtifactSymbols;
use skill_gate_core::BackendError;
use skill_gate_core::GenerateError;
use skill_gate_core::ItemId;
use skill_gate_core::ItemStatus;
use skill_gate_core::QueueItem;
use skill_gate_core::RunMetrics;
use skill_gate_core::SandboxDecision;
use skill_gate_core::SandboxExecutor;
use skill_gate_core::SkillGenerator;
use skill_gate_core::SkillName;
use skill_gate_core::SkillPackage;
use skill_gate_core::Timestamp;
use skill_gate_core::VerifyOutcome;
use skill_gate_core::VersionId;
use skill_gate_core::WorkQueue;

// ============================================================================
// SECTION: Identifier Helpers
// ============================================================================

/// Builds a validated skill name.
pub fn name(text: &str) -> SkillName {
    SkillName::new(text).expect("valid name")
}

/// Builds a validated version identifier.
pub fn version(text: &str) -> VersionId {
    VersionId::new(text).expect("valid version")
}

/// Builds a pending queue item.
pub fn pending_item(id: &str, capability: &str) -> QueueItem {
    QueueItem {
        id: ItemId::new(id),
        capability: capability.to_string(),
        first_seen: Timestamp::parse("2026-02-01T10:00:00Z").expect("stamp"),
        occurrences: 1,
        context: format!("[MISSING: {capability}]"),
        status: ItemStatus::Pending,
    }
}

/// Builds a queue from items.
pub fn queue_of(items: Vec<QueueItem>) -> WorkQueue {
    WorkQueue {
        items,
        updated_at: Timestamp::parse("2026-02-01T10:00:00Z").expect("stamp"),
    }
}

// ============================================================================
// SECTION: Scripted Generator
// ============================================================================

/// Generator double producing a fixed package per capability keyword.
pub struct ScriptedGenerator {
    /// Code to emit for generated packages.
    pub code: String,
    /// Manifest to emit for generated packages.
    pub manifest: Value,
    /// Skill name to emit.
    pub skill: String,
}

impl ScriptedGenerator {
    /// A generator whose artifact passes the default static gate and MVP
    /// manifest policy.
    pub fn safe() -> Self {
        Self {
            code: "import json\n\n\ndef action(text):\n    return {\"result\": text}\n\n\ndef verify():\n    return action(\"x\")[\"result\"] == \"x\"\n".to_string(),
            manifest: safe_manifest("stub_skill", "1.0.0"),
            skill: "stub_skill".to_string(),
        }
    }

    /// A generator whose artifact is rejected by the static gate.
    pub fn hostile() -> Self {
        Self {
            code: "import os\n\n\ndef action():\n    return os.getcwd()\n".to_string(),
            manifest: safe_manifest("stub_skill", "1.0.0"),
            skill: "stub_skill".to_string(),
        }
    }

    /// A generator whose manifest violates MVP policy.
    pub fn overreaching() -> Self {
        let mut manifest = safe_manifest("stub_skill", "1.0.0");
        manifest["permissions"]["network"] = json!(true);
        Self {
            code: "def action():\n    return {}\n\n\ndef verify():\n    return True\n"
                .to_string(),
            manifest,
            skill: "stub_skill".to_string(),
        }
    }
}

impl SkillGenerator for ScriptedGenerator {
    fn generate_skill(
        &self,
        capability: &str,
        _context: &str,
    ) -> Result<SkillPackage, GenerateError> {
        if capability.contains("unknown") {
            return Err(GenerateError::UnknownCapability(capability.to_string()));
        }
        if capability.contains("explode") {
            return Err(GenerateError::Provider("backend melted".to_string()));
        }
        Ok(SkillPackage {
            name: name(&self.skill),
            code: self.code.clone(),
            manifest: self.manifest.clone(),
            tests: Vec::new(),
        })
    }
}

/// Builds a manifest satisfying schema and MVP policy.
pub fn safe_manifest(skill: &str, ver: &str) -> Value {
    json!({
        "name": skill,
        "version": ver,
        "description": "A deterministic fixture skill for pipeline tests.",
        "inputs_schema": {"type": "object"},
        "outputs_schema": {"type": "object"},
        "permissions": {"filesystem": "none", "network": false, "subprocess": false}
    })
}

// ============================================================================
// SECTION: Scripted Sandbox
// ============================================================================

/// Sandbox double with scripted availability and verdict.
pub struct ScriptedSandbox {
    /// Availability reported by the probe.
    pub available: bool,
    /// Verdict returned by every run.
    pub pass: bool,
}

impl SandboxExecutor for ScriptedSandbox {
    fn is_available(&self) -> bool {
        self.available
    }

    fn run(&self, _artifact_dir: &Path) -> SandboxDecision {
        SandboxDecision {
            passed: self.pass,
            logs: if self.pass {
                "VERIFICATION_SUCCESS\n".to_string()
            } else {
                "VERIFICATION_FAILED: scripted failure\n".to_string()
            },
            metrics: RunMetrics {
                exit_code: Some(i64::from(!self.pass)),
                duration_ms: 42,
                timeout: false,
                error: None,
                cleanup: None,
            },
        }
    }
}

// ============================================================================
// SECTION: Echo Backend
// ============================================================================

/// Backend double scripted through the case input: `behavior` selects the
/// outcome kind, `value` is echoed back for `ok`.
pub struct EchoBackend;

impl ArtifactBackend for EchoBackend {
    fn probe(&self, _artifact_dir: &Path) -> Result<ArtifactSymbols, BackendError> {
        Ok(ArtifactSymbols {
            has_action: true,
            has_verify: true,
        })
    }

    fn invoke_action(
        &self,
        _artifact_dir: &Path,
        input: &Map<String, Value>,
        _timeout: Duration,
    ) -> Result<ActionOutcome, BackendError> {
        let behavior = input.get("behavior").and_then(Value::as_str).unwrap_or("ok");
        Ok(match behavior {
            "error" => ActionOutcome {
                value: None,
                error: Some("RuntimeError: scripted failure".to_string()),
                timed_out: false,
                duration_ms: 3,
            },
            _ => ActionOutcome {
                value: Some(input.get("value").cloned().unwrap_or(Value::Null)),
                error: None,
                timed_out: false,
                duration_ms: 2,
            },
        })
    }

    fn invoke_verify(
        &self,
        _artifact_dir: &Path,
        _timeout: Duration,
    ) -> Result<VerifyOutcome, BackendError> {
        Ok(VerifyOutcome {
            passed: true,
            detail: "VERIFICATION_SUCCESS".to_string(),
        })
    }
}

// ============================================================================
// SECTION: Case Fixtures
// ============================================================================

/// Writes an eval case file into a category directory.
pub fn write_case(eval_dir: &Path, category: &str, file_name: &str, case: &Value) {
    let dir = eval_dir.join(category);
    std::fs::create_dir_all(&dir).expect("category dir");
    std::fs::write(dir.join(file_name), serde_json::to_string_pretty(case).expect("encode"))
        .expect("write case");
}

/// Builds a passing exact-match case for a skill.
pub fn passing_case(id: &str, skill: &str) -> Value {
    json!({
        "id": id,
        "skill": skill,
        "input": {"value": "ok"},
        "expected": {"type": "exact", "value": "ok"},
        "timeout_ms": 1000
    })
}

/// Builds a failing case for a skill.
pub fn failing_case(id: &str, skill: &str) -> Value {
    json!({
        "id": id,
        "skill": skill,
        "input": {"behavior": "error"},
        "expected": {"type": "exact", "value": "never"},
        "timeout_ms": 1000
    })
}
