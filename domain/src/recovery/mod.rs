//! Output recovery: turn free-form model output into structured data.
//!
//! [`clean`] accepts either text or an already-structured value and
//! never fails on text. When nothing parses, the raw text is wrapped as
//! `{"content": raw}` and tagged [`RecoveryStrategy::WrappedAsString`];
//! callers that need a list use [`expect_list`] to reject that shape.
//!
//! Text strategies, first success wins:
//!
//! 1. strict parse of the trimmed text
//! 2. strict parse once filler phrases are removed
//! 3. strict parse of the longest bracketed span, after fence, filler
//!    and whitespace cleanup
//! 4. strict parse of a fenced code block body
//! 5. permissive literal parse of the same candidates
//! 6. wrap as a string

pub mod literal;
pub mod result;
pub mod stages;

pub use result::{RecoveryError, RecoveryResult, RecoveryStrategy, json_kind};

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```")
        .expect("FENCED_BODY is a compile-time constant")
});

/// Recover structured output from model output.
///
/// Text is always recovered; objects and arrays pass through, with a
/// single-key `{"content": ...}` wrapper unwrapped first. Any other
/// JSON value is rejected.
///
/// # Examples
///
/// ```
/// use casegen_domain::recovery::{RecoveryStrategy, clean};
/// use serde_json::json;
///
/// let result = clean(&json!("```json\n[{\"a\":1}]\n```")).unwrap();
/// assert_eq!(result.value, json!([{"a": 1}]));
/// assert_eq!(result.strategy_used, RecoveryStrategy::BracketExtracted);
///
/// assert!(clean(&json!(42)).is_err());
/// ```
pub fn clean(raw: &Value) -> Result<RecoveryResult, RecoveryError> {
    match raw {
        Value::String(text) => Ok(clean_text(text)),
        Value::Array(_) | Value::Object(_) => {
            Ok(finish(raw.clone(), raw.clone(), RecoveryStrategy::DirectPassthrough))
        }
        other => Err(RecoveryError::UnsupportedInput(json_kind(other))),
    }
}

/// Recover structured output from text. Never fails.
pub fn clean_text(raw: &str) -> RecoveryResult {
    let raw_input = Value::String(raw.to_string());
    let (value, strategy) = recover_text(raw);
    finish(raw_input, value, strategy)
}

fn recover_text(raw: &str) -> (Value, RecoveryStrategy) {
    let trimmed = raw.trim();
    if let Some(value) = strict_container(trimmed) {
        return (value, RecoveryStrategy::DirectPassthrough);
    }

    let unfilled = stages::strip_artifact_phrases(trimmed);
    if let Some(value) = strict_container(&unfilled) {
        return (value, RecoveryStrategy::PrefixSuffixStripped);
    }

    let unfenced = stages::normalize_whitespace(&stages::strip_markdown_fences(trimmed));
    let normalized = stages::normalize_whitespace(&stages::strip_artifact_phrases(&unfenced));
    let mut candidates = stages::bracket_candidates(&normalized);
    for span in stages::bracket_candidates(&unfenced) {
        if !candidates.contains(&span) {
            candidates.push(span);
        }
    }
    if let Some(value) = candidates.iter().find_map(|c| strict_container(c)) {
        return (value, RecoveryStrategy::BracketExtracted);
    }

    let bodies: Vec<&str> = FENCED_BODY
        .captures_iter(trimmed)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if let Some(value) = bodies.iter().find_map(|b| strict_container(b.trim())) {
        return (value, RecoveryStrategy::MarkdownStripped);
    }

    if let Some(value) = candidates
        .iter()
        .copied()
        .chain(std::iter::once(normalized.as_str()))
        .find_map(literal::parse_literal)
    {
        return (value, RecoveryStrategy::LiteralEval);
    }

    (
        serde_json::json!({ "content": raw }),
        RecoveryStrategy::WrappedAsString,
    )
}

fn strict_container(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Array(_) | Value::Object(_))) => Some(value),
        _ => None,
    }
}

/// Unwrap `{"content": ...}` wrappers so that recovering a recovered
/// value changes nothing.
fn finish(raw_input: Value, mut value: Value, mut strategy: RecoveryStrategy) -> RecoveryResult {
    if strategy != RecoveryStrategy::WrappedAsString {
        while let Some(inner) = content_wrapper(&value) {
            match inner {
                Value::String(text) => {
                    let (recovered, inner_strategy) = recover_text(text);
                    value = recovered;
                    if inner_strategy != RecoveryStrategy::DirectPassthrough {
                        strategy = inner_strategy;
                    }
                    if strategy == RecoveryStrategy::WrappedAsString {
                        break;
                    }
                }
                Value::Array(_) | Value::Object(_) => value = inner.clone(),
                _ => break,
            }
        }
    }
    RecoveryResult {
        raw_input,
        strategy_used: strategy,
        value,
    }
}

fn content_wrapper(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get("content"),
        _ => None,
    }
}

/// Require a list, reporting the wrapper or any other shape as a
/// mismatch.
pub fn expect_list(result: &RecoveryResult) -> Result<&Vec<Value>, RecoveryError> {
    match &result.value {
        Value::Array(items) if !result.is_wrapped() => Ok(items),
        other => Err(RecoveryError::ShapeMismatch {
            expected: "array",
            found: if result.is_wrapped() {
                "unparsed text".to_string()
            } else {
                json_kind(other).to_string()
            },
        }),
    }
}

/// Detailed test-case shape: a non-empty list whose first item is an
/// object carrying `Test_Id`.
pub fn validate_case_list(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.as_object())
        .is_some_and(|first| first.contains_key("Test_Id"))
}
