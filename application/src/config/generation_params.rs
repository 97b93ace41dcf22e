//! Generation parameters: use case loop control.
//!
//! [`GenerationParams`] groups the static parameters that control the
//! two conversations of a task and the batch around them. These are
//! application-layer concerns, not domain policy.

use casegen_domain::{CritiqueGate, OutputFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Loop control for context assembly, critique and batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Turn budget of the context-assembly conversation.
    pub context_max_turns: usize,
    /// Turn budget of the critique conversation.
    pub critique_rounds: usize,
    /// Maximum tool-use rounds inside a single agent turn.
    pub max_tool_rounds: usize,
    pub output_format: OutputFormat,
    /// Add the accessibility expert to the critique conversation.
    pub with_accessibility_expert: bool,
    /// Tasks generated at the same time.
    pub max_concurrent_tasks: usize,
    pub critique_gate: CritiqueGate,
    /// Timeout for each completion call.
    pub turn_timeout: Option<Duration>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            context_max_turns: 4,
            critique_rounds: 3,
            max_tool_rounds: 3,
            output_format: OutputFormat::default(),
            with_accessibility_expert: false,
            max_concurrent_tasks: 1,
            critique_gate: CritiqueGate::default(),
            turn_timeout: Some(Duration::from_secs(180)),
        }
    }
}

impl GenerationParams {
    // ==================== Builder Methods ====================

    pub fn with_context_max_turns(mut self, turns: usize) -> Self {
        self.context_max_turns = turns;
        self
    }

    pub fn with_critique_rounds(mut self, rounds: usize) -> Self {
        self.critique_rounds = rounds;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_accessibility_expert(mut self, enabled: bool) -> Self {
        self.with_accessibility_expert = enabled;
        self
    }

    pub fn with_max_concurrent_tasks(mut self, max: usize) -> Self {
        self.max_concurrent_tasks = max.max(1);
        self
    }

    pub fn with_critique_gate(mut self, gate: CritiqueGate) -> Self {
        self.critique_gate = gate;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = GenerationParams::default();
        assert_eq!(params.context_max_turns, 4);
        assert_eq!(params.critique_rounds, 3);
        assert_eq!(params.max_tool_rounds, 3);
        assert_eq!(params.max_concurrent_tasks, 1);
        assert_eq!(params.output_format, OutputFormat::GherkinPlain);
        assert_eq!(params.critique_gate, CritiqueGate::FixedRounds);
        assert!(!params.with_accessibility_expert);
    }

    #[test]
    fn test_builder() {
        let params = GenerationParams::default()
            .with_critique_rounds(5)
            .with_max_concurrent_tasks(0)
            .with_accessibility_expert(true)
            .with_turn_timeout(None);

        assert_eq!(params.critique_rounds, 5);
        assert_eq!(params.max_concurrent_tasks, 1);
        assert!(params.with_accessibility_expert);
        assert!(params.turn_timeout.is_none());
    }
}
