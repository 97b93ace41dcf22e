//! Knowledge retrieval settings from TOML (`[retrieval]` section)

use casegen_domain::KnowledgeSources;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Graph query command and the knowledge index it reads
///
/// # Example
///
/// ```toml
/// [retrieval]
/// command = "graphrag"
/// index_root = "/srv/graphs"
/// project_id = "BANK"
/// timeout_secs = 300
///
/// [retrieval.sources]
/// requirements = "graph_us"
/// accessibility = "expert_rgaa"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetrievalConfig {
    /// Query executable, looked up on `PATH`; may carry leading arguments
    pub command: String,
    /// Directory holding `<knowledge_source>/<project_id>` indexes
    pub index_root: PathBuf,
    /// Default project when the CLI gives none
    pub project_id: Option<String>,
    pub timeout_secs: u64,
    /// Knowledge graph name per retrieval role
    pub sources: KnowledgeSources,
}

impl Default for FileRetrievalConfig {
    fn default() -> Self {
        Self {
            command: "graphrag".to_string(),
            index_root: PathBuf::from("graphs"),
            project_id: None,
            timeout_secs: 300,
            sources: KnowledgeSources::default(),
        }
    }
}

impl FileRetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
