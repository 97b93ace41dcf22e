//! Output settings from TOML (`[output]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where results, history and transcripts are written
///
/// ```toml
/// [output]
/// dir = "out"
/// color = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub dir: PathBuf,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("casegen-output"),
            color: true,
        }
    }
}

impl FileOutputConfig {
    /// Result columns of a run
    pub fn results_path(&self) -> PathBuf {
        self.dir.join("results.json")
    }

    /// Append-only generation history
    pub fn history_path(&self) -> PathBuf {
        self.dir.join("test_case_history.json")
    }

    /// Per-phase conversation exports
    pub fn transcripts_dir(&self) -> PathBuf {
        self.dir.join("conversations")
    }

    /// JSONL turn log
    pub fn conversation_log_path(&self) -> PathBuf {
        self.dir.join("conversation.jsonl")
    }
}
