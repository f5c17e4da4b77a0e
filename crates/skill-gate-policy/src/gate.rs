// crates/skill-gate-policy/src/gate.rs
// ============================================================================
// Module: Static Security Gate
// Description: Three-phase deny-by-default analysis of skill source code.
// Purpose: Accumulate violations from textual, syntactic, and structural checks.
// Dependencies: crate::tables, regex, serde, tree-sitter, tree-sitter-python
// ============================================================================

//! ## Overview
//! `StaticGate::check` runs three phases in order: a raw-text scan for
//! suspicious patterns, a structural parse, and a tree walk evaluating
//! imports, from-imports, call sites, and attribute accesses against the
//! policy tables. Violations accumulate across phases, except that a parse
//! failure short-circuits to a single syntax-error violation. Aliased
//! imports do not evade detection because the original module name is
//! inspected; chained attribute escapes are caught at the attribute level
//! even when the final call site appears innocent.
//!
//! The gate is purely deterministic and never retries; callers treat any
//! non-pass as terminal for the artifact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use tree_sitter::Language;
use tree_sitter::Node;
use tree_sitter::Parser;

use crate::tables::PolicyError;
use crate::tables::PolicyTables;

// ============================================================================
// SECTION: Gate Result
// ============================================================================

/// Outcome of one static gate check.
///
/// # Invariants
/// - `passed` is true if and only if `violations` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// Whether the gate passed.
    pub passed: bool,
    /// Accumulated violation descriptions.
    pub violations: Vec<String>,
}

impl GateResult {
    /// Builds a result from accumulated violations.
    #[must_use]
    pub fn from_violations(violations: Vec<String>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }
}

// ============================================================================
// SECTION: Static Gate
// ============================================================================

/// Deny-by-default static source analyzer.
///
/// # Invariants
/// - Patterns are compiled once at construction; `check` never fails, it
///   only accumulates violations.
pub struct StaticGate {
    /// Active policy tables.
    tables: PolicyTables,
    /// Compiled suspicious patterns paired with their source text.
    patterns: Vec<(String, Regex)>,
    /// Grammar used for the structural phases.
    language: Language,
}

impl StaticGate {
    /// Builds a gate over the given policy tables.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPattern`] when a suspicious pattern does
    /// not compile and [`PolicyError::Grammar`] when the analyzer grammar
    /// cannot be loaded.
    pub fn new(tables: PolicyTables) -> Result<Self, PolicyError> {
        let mut patterns = Vec::with_capacity(tables.suspicious_patterns.len());
        for pattern in &tables.suspicious_patterns {
            let compiled = Regex::new(pattern).map_err(|err| PolicyError::InvalidPattern {
                pattern: pattern.clone(),
                detail: err.to_string(),
            })?;
            patterns.push((pattern.clone(), compiled));
        }

        let language: Language = tree_sitter_python::LANGUAGE.into();
        let mut probe = Parser::new();
        probe.set_language(&language).map_err(|err| PolicyError::Grammar(err.to_string()))?;

        Ok(Self {
            tables,
            patterns,
            language,
        })
    }

    /// Builds a gate over the default policy tables.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the built-in tables fail to compile,
    /// which indicates a packaging defect.
    pub fn with_defaults() -> Result<Self, PolicyError> {
        Self::new(PolicyTables::default())
    }

    /// Returns the active policy tables.
    #[must_use]
    pub const fn tables(&self) -> &PolicyTables {
        &self.tables
    }

    /// Performs the three-phase security check on a code string.
    #[must_use]
    pub fn check(&self, code: &str) -> GateResult {
        let mut violations = self.scan_text(code);

        let mut parser = Parser::new();
        if parser.set_language(&self.language).is_err() {
            // Grammar loss after construction is an analyzer defect; deny.
            return GateResult::from_violations(vec![
                "Syntax error: analyzer grammar unavailable".to_string(),
            ]);
        }
        let Some(tree) = parser.parse(code, None) else {
            return GateResult::from_violations(vec![
                "Syntax error: source could not be parsed".to_string(),
            ]);
        };

        let root = tree.root_node();
        if root.has_error() {
            let detail = first_error(root).map_or_else(
                || "invalid syntax".to_string(),
                |node| {
                    let position = node.start_position();
                    format!(
                        "invalid syntax at line {}, column {}",
                        position.row + 1,
                        position.column + 1
                    )
                },
            );
            return GateResult::from_violations(vec![format!("Syntax error: {detail}")]);
        }

        self.walk(root, code.as_bytes(), &mut violations);
        GateResult::from_violations(violations)
    }

    /// Phase 1: scans raw source text for suspicious patterns.
    fn scan_text(&self, code: &str) -> Vec<String> {
        let mut violations = Vec::new();
        for (source, compiled) in &self.patterns {
            if compiled.is_match(code) {
                violations.push(format!("Suspicious pattern detected: {source}"));
            }
        }
        violations
    }

    /// Phase 3: walks every node, dispatching the structural checks.
    fn walk(&self, node: Node<'_>, source: &[u8], violations: &mut Vec<String>) {
        match node.kind() {
            "import_statement" => self.check_import(node, source, violations),
            "import_from_statement" => self.check_import_from(node, source, violations),
            "call" => self.check_call(node, source, violations),
            "attribute" => self.check_attribute(node, source, violations),
            _ => {}
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, source, violations);
        }
    }

    /// Checks `import x` / `import x.y as z` statements.
    fn check_import(&self, node: Node<'_>, source: &[u8], violations: &mut Vec<String>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let dotted = match child.kind() {
                "dotted_name" => Some(child),
                "aliased_import" => child.child_by_field_name("name"),
                _ => None,
            };
            let Some(name) = dotted.and_then(|n| node_text(n, source)) else {
                continue;
            };
            if !self.module_allowed(&name) {
                violations.push(format!("Forbidden import: {name}"));
            }
        }
    }

    /// Checks `from x import y` statements against the module being imported
    /// from. Relative imports have no allowlisted top level and are denied.
    fn check_import_from(&self, node: Node<'_>, source: &[u8], violations: &mut Vec<String>) {
        let Some(module) = node.child_by_field_name("module_name") else {
            return;
        };
        let Some(name) = node_text(module, source) else {
            return;
        };
        if module.kind() == "relative_import" || !self.module_allowed(&name) {
            violations.push(format!("Forbidden import from: {name}"));
        }
    }

    /// Checks call sites: bare names and the terminal attribute of a dotted
    /// call.
    fn check_call(&self, node: Node<'_>, source: &[u8], violations: &mut Vec<String>) {
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        let name = match callee.kind() {
            "identifier" => node_text(callee, source),
            "attribute" => callee.child_by_field_name("attribute").and_then(|n| {
                node_text(n, source)
            }),
            _ => None,
        };
        if let Some(name) = name
            && self.tables.forbidden_calls.contains(&name)
        {
            violations.push(format!("Forbidden call: {name}"));
        }
    }

    /// Checks attribute accesses for forbidden attribute names.
    fn check_attribute(&self, node: Node<'_>, source: &[u8], violations: &mut Vec<String>) {
        let Some(name) = node.child_by_field_name("attribute").and_then(|n| {
            node_text(n, source)
        }) else {
            return;
        };
        if self.tables.forbidden_attributes.contains(&name) {
            violations.push(format!("Forbidden attribute access: {name}"));
        }
    }

    /// Decides whether a dotted module path has an allowlisted top level.
    fn module_allowed(&self, dotted: &str) -> bool {
        let top_level = dotted.split('.').next().unwrap_or(dotted);
        self.tables.allowed_modules.contains(top_level)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts a node's source text.
fn node_text(node: Node<'_>, source: &[u8]) -> Option<String> {
    node.utf8_text(source).ok().map(ToString::to_string)
}

/// Finds the first error or missing node in the tree, depth-first.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
