//! Generation settings from TOML (`[generation]` section)

use casegen_application::GenerationParams;
use casegen_domain::config::validation::{ConfigIssue, ConfigIssueCode, check_budgets};
use casegen_domain::{CritiqueGate, OutputFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Conversation budgets, output format and batching
///
/// # Example
///
/// ```toml
/// [generation]
/// context_max_turns = 4
/// critique_rounds = 3
/// output_format = "gherkin-parameterized"
/// max_concurrent_tasks = 2
/// critique_score_threshold = 8.0   # stop critiquing early at 8/10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    pub context_max_turns: usize,
    pub critique_rounds: usize,
    pub max_tool_rounds: usize,
    pub output_format: String,
    pub with_accessibility_expert: bool,
    pub max_concurrent_tasks: usize,
    /// Unset: every critique round runs
    pub critique_score_threshold: Option<f64>,
    /// Per-completion timeout; 0 disables it
    pub turn_timeout_secs: u64,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            context_max_turns: params.context_max_turns,
            critique_rounds: params.critique_rounds,
            max_tool_rounds: params.max_tool_rounds,
            output_format: params.output_format.as_str().to_string(),
            with_accessibility_expert: params.with_accessibility_expert,
            max_concurrent_tasks: params.max_concurrent_tasks,
            critique_score_threshold: None,
            turn_timeout_secs: params.turn_timeout.map_or(0, |t| t.as_secs()),
        }
    }
}

impl FileGenerationConfig {
    /// Unknown format names fall back to the default format.
    pub fn parse_output_format(&self) -> (OutputFormat, Vec<ConfigIssue>) {
        match OutputFormat::parse(&self.output_format) {
            Some(format) => (format, Vec::new()),
            None => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "generation.output_format".to_string(),
                        value: self.output_format.clone(),
                        valid_values: OutputFormat::ALL
                            .iter()
                            .map(|f| f.as_str().to_string())
                            .collect(),
                    },
                    format!(
                        "generation.output_format: unknown value '{}', falling back to '{}'",
                        self.output_format,
                        OutputFormat::default()
                    ),
                );
                (OutputFormat::default(), vec![issue])
            }
        }
    }

    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_output_format().1;
        issues.extend(check_budgets(&[
            ("generation.context_max_turns", self.context_max_turns),
            ("generation.critique_rounds", self.critique_rounds),
            ("generation.max_concurrent_tasks", self.max_concurrent_tasks),
        ]));
        if let Some(threshold) = self.critique_score_threshold
            && !(0.0..=10.0).contains(&threshold)
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ThresholdOutOfRange {
                    value: threshold.to_string(),
                },
                format!(
                    "generation.critique_score_threshold: {} is outside 0-10, clamping",
                    threshold
                ),
            ));
        }
        issues
    }

    pub fn to_params(&self) -> GenerationParams {
        let timeout =
            (self.turn_timeout_secs > 0).then(|| Duration::from_secs(self.turn_timeout_secs));
        GenerationParams::default()
            .with_context_max_turns(self.context_max_turns)
            .with_critique_rounds(self.critique_rounds)
            .with_max_tool_rounds(self.max_tool_rounds)
            .with_output_format(self.parse_output_format().0)
            .with_accessibility_expert(self.with_accessibility_expert)
            .with_max_concurrent_tasks(self.max_concurrent_tasks)
            .with_critique_gate(CritiqueGate::from_threshold(self.critique_score_threshold))
            .with_turn_timeout(timeout)
    }
}
