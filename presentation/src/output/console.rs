//! Console output formatter for batch results

use casegen_domain::batch::result::CANCELLED;
use casegen_domain::{BatchResult, ConfigIssue, RequirementRecord};
use colored::Colorize;
use std::path::Path;

/// Outcome of one row, read back from the result columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowStatus {
    Generated,
    Failed,
    Cancelled,
}

fn row_status(artifact: &str) -> RowStatus {
    if artifact == CANCELLED {
        RowStatus::Cancelled
    } else if artifact.starts_with("Error: ") {
        RowStatus::Failed
    } else {
        RowStatus::Generated
    }
}

/// Formats batch results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Per-requirement table followed by totals.
    pub fn format_summary(
        result: &BatchResult,
        records: &[RequirementRecord],
        results_path: Option<&Path>,
    ) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Test Case Generation"));
        output.push('\n');

        let mut counts = [0usize; 3];
        for (i, artifact) in result.artifacts.iter().enumerate() {
            let record = records.get(i);
            let id = record.map_or_else(|| format!("#{}", i + 1), |r| r.id_or_index(i));
            let title = record.map(|r| r.title.as_str()).unwrap_or_default();
            let cost = result.costs.get(i).map(String::as_str).unwrap_or_default();

            let status = row_status(artifact);
            let marker = match status {
                RowStatus::Generated => {
                    counts[0] += 1;
                    "v".green()
                }
                RowStatus::Failed => {
                    counts[1] += 1;
                    "x".red()
                }
                RowStatus::Cancelled => {
                    counts[2] += 1;
                    "-".yellow()
                }
            };
            output.push_str(&format!(
                "  {} {} {} {}\n",
                marker,
                id.bold(),
                title,
                format!("({cost})").dimmed()
            ));
            if status == RowStatus::Failed {
                output.push_str(&format!("      {}\n", artifact.red()));
            }
        }

        output.push_str(&Self::section_header("Summary"));
        output.push_str(&format!(
            "{} {}   {} {}   {} {}\n",
            "Generated:".green().bold(),
            counts[0],
            "Failed:".red().bold(),
            counts[1],
            "Cancelled:".yellow().bold(),
            counts[2]
        ));
        output.push_str(&format!(
            "{} {}\n",
            "History entries written:".cyan().bold(),
            result.history.len()
        ));
        if let Some(path) = results_path {
            output.push_str(&format!(
                "{} {}\n",
                "Results:".cyan().bold(),
                path.display()
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Configuration problems, errors first.
    pub fn format_config_issues(issues: &[ConfigIssue]) -> String {
        let mut sorted: Vec<&ConfigIssue> = issues.iter().collect();
        sorted.sort_by_key(|issue| !issue.is_error());

        sorted
            .into_iter()
            .map(|issue| {
                if issue.is_error() {
                    format!("{} {}\n", "error:".red().bold(), issue.message)
                } else {
                    format!("{} {}\n", "warning:".yellow().bold(), issue.message)
                }
            })
            .collect()
    }

    /// Configuration file locations, as listed by `--show-config`.
    pub fn format_config_sources(sources: &[String]) -> String {
        let mut output = format!("{}\n", "Configuration sources (lowest priority first):".bold());
        for source in sources {
            output.push_str(&format!("  * {}\n", source));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!(
            "\n{}\n{}\n{}\n",
            line.cyan(),
            format!("  {}", title).cyan().bold(),
            line.cyan()
        )
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n", format!("> {}", title).blue().bold())
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
