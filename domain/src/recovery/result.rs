//! Recovery results and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which path produced the recovered value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryStrategy {
    /// Input was already structured, or parsed as-is
    DirectPassthrough,
    /// Parsed once code fences were removed
    MarkdownStripped,
    /// Parsed once filler phrases were removed
    PrefixSuffixStripped,
    /// Parsed from the longest bracketed span
    BracketExtracted,
    /// Parsed by the permissive literal parser
    LiteralEval,
    /// Nothing parsed; raw text wrapped as `{"content": raw}`
    WrappedAsString,
}

impl RecoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::DirectPassthrough => "direct-passthrough",
            RecoveryStrategy::MarkdownStripped => "markdown-stripped",
            RecoveryStrategy::PrefixSuffixStripped => "prefix-suffix-stripped",
            RecoveryStrategy::BracketExtracted => "bracket-extracted",
            RecoveryStrategy::LiteralEval => "literal-eval",
            RecoveryStrategy::WrappedAsString => "wrapped-as-string",
        }
    }
}

impl std::fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of output recovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub raw_input: serde_json::Value,
    pub strategy_used: RecoveryStrategy,
    /// Always an object or an array
    pub value: serde_json::Value,
}

impl RecoveryResult {
    pub fn is_wrapped(&self) -> bool {
        self.strategy_used == RecoveryStrategy::WrappedAsString
    }

    /// Text to store as the artifact: the original text when nothing
    /// could be recovered, pretty JSON otherwise.
    pub fn artifact_text(&self) -> String {
        if self.is_wrapped()
            && let Some(raw) = self.value.get("content").and_then(|v| v.as_str())
        {
            return raw.to_string();
        }
        serde_json::to_string_pretty(&self.value).unwrap_or_else(|_| self.value.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    /// Input is neither text nor a container
    #[error("Cannot recover structured output from {0} input")]
    UnsupportedInput(&'static str),

    #[error("Expected {expected}, got {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: String,
    },
}

/// Short JSON type name used in error messages.
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
