//! Logging settings from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Diagnostic log files
///
/// ```toml
/// [logging]
/// dir = "logs"          # daily-rolling casegen.log.<date>
/// conversations = true  # JSONL log of every turn
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Unset: logs go to stderr only
    pub dir: Option<PathBuf>,
    pub conversations: bool,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            conversations: true,
        }
    }
}
