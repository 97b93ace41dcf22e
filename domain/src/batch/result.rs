//! Batch results: the four aligned sequences and the generation history.

use super::record::RequirementRecord;
use crate::completion::response::TokenUsage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cost value when nothing was measured.
pub const COST_PLACEHOLDER: &str = "blank";
/// Cost value of a failed task.
pub const FAILED_COST: &str = "Error - No cost calculated";
/// Value of every column for a task that never ran.
pub const CANCELLED: &str = "Cancelled";
/// History metadata `source` for file-loaded requirements.
pub const DEFAULT_SOURCE: &str = "requirements_file";

/// Column names written to the result sink.
pub mod columns {
    pub const PROMPTS: &str = "Row_Generated Prompts";
    pub const FULL_PROMPTS: &str = "Final input prompts";
    pub const ARTIFACTS: &str = "Test Cases";
    pub const COSTS: &str = "Costs";
    pub const IDS: &str = "id_US";
    pub const TITLES: &str = "Title";
}

/// Token usage per phase of one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCosts {
    pub context_assembly: Option<TokenUsage>,
    pub generation: Option<TokenUsage>,
}

impl PhaseCosts {
    fn render(usage: Option<TokenUsage>) -> String {
        match usage {
            Some(u) if u.total() > 0 => format!("{} tokens", u.total()),
            _ => COST_PLACEHOLDER.to_string(),
        }
    }

    /// Per-phase map as stored in history entries.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "context_assembly".to_string(),
                Self::render(self.context_assembly),
            ),
            ("generation".to_string(), Self::render(self.generation)),
        ])
    }

    /// Single cell for the costs column.
    pub fn summary(&self) -> String {
        let total = self.context_assembly.unwrap_or_default().total()
            + self.generation.unwrap_or_default().total();
        if total == 0 {
            COST_PLACEHOLDER.to_string()
        } else {
            format!("{total} tokens")
        }
    }
}

/// What a successful task produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput {
    /// Prompt assembled by the context phase
    pub prompt: String,
    /// Generator instructions followed by the assembled prompt
    pub full_prompt: String,
    pub artifact: String,
    pub costs: PhaseCosts,
}

/// One row of the four aligned sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub prompt: String,
    pub full_prompt: String,
    pub artifact: String,
    pub cost: String,
}

impl TaskRow {
    pub fn completed(output: &TaskOutput) -> Self {
        Self {
            prompt: output.prompt.clone(),
            full_prompt: output.full_prompt.clone(),
            artifact: output.artifact.clone(),
            cost: output.costs.summary(),
        }
    }

    /// Diagnostic row for the task at 0-based `index`.
    pub fn failed(index: usize, error: &str) -> Self {
        let label = format!("Error processing requirement {}", index + 1);
        Self {
            prompt: label.clone(),
            full_prompt: label,
            artifact: format!("Error: {error}"),
            cost: FAILED_COST.to_string(),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            prompt: CANCELLED.to_string(),
            full_prompt: CANCELLED.to_string(),
            artifact: CANCELLED.to_string(),
            cost: CANCELLED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMetadata {
    pub format: String,
    pub source: String,
}

/// Durable record of one successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub requirement_id: String,
    pub requirement_title: String,
    pub test_case: String,
    pub prompt: String,
    pub costs: BTreeMap<String, String>,
    pub metadata: HistoryMetadata,
}

impl HistoryEntry {
    pub fn new(
        index: usize,
        record: &RequirementRecord,
        output: &TaskOutput,
        metadata: HistoryMetadata,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            requirement_id: record.id_or_index(index),
            requirement_title: record.title.clone(),
            test_case: output.artifact.clone(),
            prompt: output.prompt.clone(),
            costs: output.costs.to_map(),
            metadata,
        }
    }
}

/// Four equal-length sequences plus the history of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub prompts: Vec<String>,
    pub full_prompts: Vec<String>,
    pub artifacts: Vec<String>,
    pub costs: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

impl BatchResult {
    pub fn push_row(&mut self, row: TaskRow) {
        self.prompts.push(row.prompt);
        self.full_prompts.push(row.full_prompt);
        self.artifacts.push(row.artifact);
        self.costs.push(row.cost);
    }

    /// Lengths of prompts, full prompts, artifacts, costs.
    pub fn lengths(&self) -> [usize; 4] {
        [
            self.prompts.len(),
            self.full_prompts.len(),
            self.artifacts.len(),
            self.costs.len(),
        ]
    }

    /// Whether all four sequences have `expected` entries.
    pub fn is_aligned(&self, expected: usize) -> bool {
        self.lengths().iter().all(|&len| len == expected)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Column mapping for the result sink, with ids and titles taken
    /// from `records`.
    pub fn columns(&self, records: &[RequirementRecord]) -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            (columns::PROMPTS.to_string(), self.prompts.clone()),
            (columns::FULL_PROMPTS.to_string(), self.full_prompts.clone()),
            (columns::ARTIFACTS.to_string(), self.artifacts.clone()),
            (columns::COSTS.to_string(), self.costs.clone()),
            (
                columns::IDS.to_string(),
                records
                    .iter()
                    .enumerate()
                    .map(|(i, r)| r.id_or_index(i))
                    .collect(),
            ),
            (
                columns::TITLES.to_string(),
                records.iter().map(|r| r.title.clone()).collect(),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output() -> TaskOutput {
        TaskOutput {
            prompt: "assembled".to_string(),
            full_prompt: "instructions\nassembled".to_string(),
            artifact: "[]".to_string(),
            costs: PhaseCosts::default(),
        }
    }

    #[test]
    fn test_failed_row_placeholders() {
        let row = TaskRow::failed(1, "timeout");
        assert_eq!(row.prompt, "Error processing requirement 2");
        assert_eq!(row.full_prompt, "Error processing requirement 2");
        assert_eq!(row.artifact, "Error: timeout");
        assert_eq!(row.cost, "Error - No cost calculated");
    }

    #[test]
    fn test_costs_blank_without_usage() {
        let costs = PhaseCosts::default();
        assert_eq!(costs.summary(), "blank");
        assert_eq!(costs.to_map()["context_assembly"], "blank");
        assert_eq!(costs.to_map()["generation"], "blank");
    }

    #[test]
    fn test_costs_with_usage() {
        let costs = PhaseCosts {
            context_assembly: Some(TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
            }),
            generation: None,
        };
        assert_eq!(costs.summary(), "120 tokens");
        assert_eq!(costs.to_map()["context_assembly"], "120 tokens");
        assert_eq!(costs.to_map()["generation"], "blank");
    }

    #[test]
    fn test_push_rows_aligned() {
        let mut result = BatchResult::default();
        result.push_row(TaskRow::completed(&output()));
        result.push_row(TaskRow::failed(1, "boom"));
        result.push_row(TaskRow::cancelled());
        assert!(result.is_aligned(3));
        assert!(!result.is_aligned(2));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_columns() {
        let mut result = BatchResult::default();
        result.push_row(TaskRow::completed(&output()));
        result.push_row(TaskRow::failed(1, "boom"));
        let records = vec![
            RequirementRecord::new("Login", "").with_id("PRJ-1"),
            RequirementRecord::new("Logout", ""),
        ];
        let columns = result.columns(&records);
        assert_eq!(columns.len(), 6);
        assert_eq!(columns[columns::IDS], vec!["PRJ-1", "no_id_1"]);
        assert_eq!(columns[columns::TITLES], vec!["Login", "Logout"]);
        assert_eq!(columns[columns::ARTIFACTS][1], "Error: boom");
        assert_eq!(columns[columns::FULL_PROMPTS][0], "instructions\nassembled");
    }

    #[test]
    fn test_history_entry_serialization() {
        let record = RequirementRecord::new("Login", "desc");
        let entry = HistoryEntry::new(
            4,
            &record,
            &output(),
            HistoryMetadata {
                format: "gherkin-plain".to_string(),
                source: DEFAULT_SOURCE.to_string(),
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["requirement_id"], "no_id_4");
        assert_eq!(json["requirement_title"], "Login");
        assert_eq!(json["costs"]["generation"], "blank");
        assert_eq!(json["metadata"]["source"], "requirements_file");
    }
}
