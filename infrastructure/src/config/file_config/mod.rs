//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application values.

mod generation;
mod logging;
mod models;
mod output;
mod providers;
mod retrieval;

pub use generation::FileGenerationConfig;
pub use logging::FileLoggingConfig;
pub use models::FileModelsConfig;
pub use output::FileOutputConfig;
pub use providers::{FileOpenAiConfig, FileProvidersConfig};
pub use retrieval::FileRetrievalConfig;

use casegen_domain::config::validation::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Role-based model selection
    pub models: FileModelsConfig,
    /// Conversation budgets, output format and batching
    pub generation: FileGenerationConfig,
    /// Knowledge graph queries
    pub retrieval: FileRetrievalConfig,
    pub output: FileOutputConfig,
    /// Completion endpoint settings
    pub providers: FileProvidersConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks empty model names, unknown output formats, zero budgets and
    /// out-of-range score thresholds.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.models.issues();
        issues.extend(self.generation.issues());
        issues
    }
}
