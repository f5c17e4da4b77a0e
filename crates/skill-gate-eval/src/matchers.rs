// crates/skill-gate-eval/src/matchers.rs
// ============================================================================
// Module: Expected-Outcome Matchers
// Description: Case verdict evaluation against expectation specifications.
// Purpose: Decide case pass/fail from the result, error, and duration.
// Dependencies: serde_jcs, serde_json
// ============================================================================

//! ## Overview
//! The `expected` record of a case carries a `type` tag selecting the
//! matcher: `exact` (deep structural equality), `contains` (substring or
//! all-values containment), `no_forbidden_patterns` (denylist over the
//! stringified result), and `timeout_or_error` (the case passes when the
//! invocation failed or ran long enough). Unknown types fail the case.
//! Non-string results are stringified as canonical JSON text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Stringification
// ============================================================================

/// Stringifies a result value for containment checks.
///
/// Strings are used raw; every other value becomes canonical JSON text.
#[must_use]
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_jcs::to_vec(other).map_or_else(
            |_| other.to_string(),
            |bytes| String::from_utf8_lossy(&bytes).into_owned(),
        ),
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates a case outcome against its expectation specification.
#[must_use]
pub fn evaluate_expected(
    result: Option<&Value>,
    expected: &Value,
    error: Option<&str>,
    duration_ms: u64,
) -> bool {
    let kind = expected.get("type").and_then(Value::as_str).unwrap_or("exact");
    match kind {
        "exact" => match_exact(result, expected),
        "contains" => match_contains(result, expected),
        "no_forbidden_patterns" => match_no_forbidden_patterns(result, expected),
        "timeout_or_error" => match_timeout_or_error(expected, error, duration_ms),
        _ => false,
    }
}

/// `exact`: deep structural equality with the expected value.
fn match_exact(result: Option<&Value>, expected: &Value) -> bool {
    let actual = result.unwrap_or(&Value::Null);
    let wanted = expected.get("value").unwrap_or(&Value::Null);
    actual == wanted
}

/// `contains`: substring containment for strings, or stringified containment
/// of every listed value.
fn match_contains(result: Option<&Value>, expected: &Value) -> bool {
    if let Some(substring) = expected.get("substring").and_then(Value::as_str) {
        let Some(Value::String(text)) = result else {
            return false;
        };
        return text.contains(substring);
    }

    if let Some(values) = expected.get("values").and_then(Value::as_array) {
        let Some(result) = result else {
            return false;
        };
        let haystack = stringify_value(result);
        return values.iter().all(|value| haystack.contains(&stringify_value(value)));
    }

    false
}

/// `no_forbidden_patterns`: the stringified result contains none of the
/// forbidden fragments.
fn match_no_forbidden_patterns(result: Option<&Value>, expected: &Value) -> bool {
    let haystack = result.map(stringify_value).unwrap_or_default();
    let Some(forbidden) = expected.get("forbidden").and_then(Value::as_array) else {
        return true;
    };
    !forbidden.iter().any(|pattern| haystack.contains(&stringify_value(pattern)))
}

/// `timeout_or_error`: passes on any raised error, or when the invocation
/// ran at least `max_duration_ms`.
fn match_timeout_or_error(expected: &Value, error: Option<&str>, duration_ms: u64) -> bool {
    if error.is_some() {
        return true;
    }
    let max_duration_ms = expected.get("max_duration_ms").and_then(Value::as_u64).unwrap_or(5_000);
    duration_ms >= max_duration_ms
}
