//! Writes each conversation transcript as a text log and a JSON record.
//!
//! Both files share a stem:
//! `conversation_log_<step>_<YYYYmmdd_HHMMSS>.{txt,json}`.

use casegen_application::{ExportError, TranscriptExport, TranscriptExporter};
use casegen_domain::core::string::sanitize_label;
use casegen_domain::{Message, Transcript};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const FILE_PREFIX: &str = "conversation_log";
const PREVIEW_CHARS: usize = 200;

/// Exports transcripts into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FileTranscriptExporter {
    dir: PathBuf,
}

impl FileTranscriptExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Serialize)]
struct ExportRecord<'a> {
    metadata: ExportMetadata<'a>,
    messages: Vec<MessageRecord>,
    agent_groups: BTreeMap<&'a str, Vec<usize>>,
}

#[derive(Serialize)]
struct ExportMetadata<'a> {
    step_name: &'a str,
    generated_at: String,
    total_messages: usize,
    agents: Vec<&'a str>,
    message_kinds: Vec<&'static str>,
}

#[derive(Serialize)]
struct MessageRecord {
    index: usize,
    source: String,
    kind: &'static str,
    timestamp: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

impl MessageRecord {
    fn new(index: usize, message: &Message) -> Self {
        Self {
            index,
            source: message.source.clone(),
            kind: message.kind.as_str(),
            timestamp: message.timestamp.to_rfc3339(),
            content: message.text_content(),
            tool_calls: message.tool_calls.iter().map(ToString::to_string).collect(),
            score: message.score,
        }
    }
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

fn render_text(
    step_name: &str,
    generated_at: &str,
    records: &[MessageRecord],
    transcript: &Transcript,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(80);
    let _ = writeln!(out, "CONVERSATION LOG - {step_name}");
    let _ = writeln!(out, "Generated: {generated_at}");
    let _ = writeln!(out, "Total Messages: {}", records.len());
    let _ = writeln!(out, "{rule}\n");

    let groups = transcript.agent_groups();
    for agent in transcript.agents() {
        let indices = groups.get(agent).map(Vec::as_slice).unwrap_or_default();
        let _ = writeln!(out, "=== {agent} Messages ({} total) ===\n", indices.len());
        for record in indices.iter().filter_map(|&i| records.get(i)) {
            let _ = writeln!(out, "[Message {}] {}", record.index, record.source);
            let _ = writeln!(out, "Kind: {}", record.kind);
            let _ = writeln!(out, "Timestamp: {}", record.timestamp);
            if !record.content.is_empty() {
                let _ = writeln!(out, "Content:\n{}", record.content);
            }
            if !record.tool_calls.is_empty() {
                let _ = writeln!(out, "Tool Calls:");
                for call in &record.tool_calls {
                    let _ = writeln!(out, "  - {call}");
                }
            }
            if let Some(score) = record.score {
                let _ = writeln!(out, "Score: {score}");
            }
            let _ = writeln!(out, "{}\n", "-".repeat(40));
        }
    }

    let _ = writeln!(out, "\n=== CHRONOLOGICAL VIEW ===\n");
    for record in records {
        let _ = writeln!(out, "[{}] {}: {}", record.index, record.source, preview(&record.content));
        if !record.tool_calls.is_empty() {
            let _ = writeln!(out, "    Tool Calls: {} detected", record.tool_calls.len());
        }
        out.push('\n');
    }
    out
}

impl TranscriptExporter for FileTranscriptExporter {
    fn export(
        &self,
        step_name: &str,
        transcript: &Transcript,
    ) -> Result<TranscriptExport, ExportError> {
        std::fs::create_dir_all(&self.dir)?;

        let now = chrono::Local::now();
        let stem = format!(
            "{}_{}_{}",
            FILE_PREFIX,
            sanitize_label(step_name),
            now.format("%Y%m%d_%H%M%S")
        );
        let text_path = self.dir.join(format!("{stem}.txt"));
        let json_path = self.dir.join(format!("{stem}.json"));
        let generated_at = now.to_rfc3339();

        let records: Vec<MessageRecord> = transcript
            .chronological()
            .iter()
            .enumerate()
            .map(|(i, m)| MessageRecord::new(i, m))
            .collect();

        std::fs::write(
            &text_path,
            render_text(step_name, &generated_at, &records, transcript),
        )?;

        let record = ExportRecord {
            metadata: ExportMetadata {
                step_name,
                generated_at,
                total_messages: records.len(),
                agents: transcript.agents(),
                message_kinds: transcript.kinds().iter().map(|k| k.as_str()).collect(),
            },
            messages: records,
            agent_groups: transcript.agent_groups(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| ExportError::Serialization(e.to_string()))?;
        std::fs::write(&json_path, json)?;

        info!(
            step = step_name,
            messages = transcript.len(),
            path = %text_path.display(),
            "Transcript exported"
        );
        Ok(TranscriptExport {
            text_path,
            json_path,
        })
    }
}
