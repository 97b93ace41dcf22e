//! Role-based model configuration from TOML (`[models]` section)

use casegen_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use casegen_domain::{Model, ModelConfig};
use serde::{Deserialize, Serialize};

/// Role-based model configuration from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// orchestrator = "gpt-4o"        # Planner steering context assembly
/// workers = "gpt-4o-mini"        # Retrieval, synthesis and expert agents
/// generator = "gpt-4.1"          # Test case writer
/// critic = "gpt-4o"              # Every critic
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub orchestrator: Option<String>,
    pub workers: Option<String>,
    pub generator: Option<String>,
    pub critic: Option<String>,
}

impl FileModelsConfig {
    /// Parse a single model string, collecting issues for empty names.
    fn parse_single_model(
        field: &str,
        value: Option<&String>,
    ) -> (Option<Model>, Vec<ConfigIssue>) {
        match value {
            None => (None, Vec::new()),
            Some(s) if s.trim().is_empty() => (
                None,
                vec![ConfigIssue::warning(
                    ConfigIssueCode::EmptyModelName {
                        field: field.to_string(),
                    },
                    format!("models.{}: model name cannot be empty, using default", field),
                )],
            ),
            Some(s) => {
                // unknown names become Model::Custom
                let Ok(model) = s.trim().parse::<Model>();
                (Some(model), Vec::new())
            }
        }
    }

    pub fn parse_orchestrator(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("orchestrator", self.orchestrator.as_ref())
    }

    pub fn parse_workers(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("workers", self.workers.as_ref())
    }

    pub fn parse_generator(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("generator", self.generator.as_ref())
    }

    pub fn parse_critic(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("critic", self.critic.as_ref())
    }

    /// Build the domain model configuration; unset or invalid fields keep
    /// their defaults.
    pub fn to_model_config(&self) -> ModelConfig {
        let mut config = ModelConfig::default();
        if let (Some(model), _) = self.parse_orchestrator() {
            config = config.with_orchestrator(model);
        }
        if let (Some(model), _) = self.parse_workers() {
            config = config.with_workers(model);
        }
        if let (Some(model), _) = self.parse_generator() {
            config = config.with_generator(model);
        }
        if let (Some(model), _) = self.parse_critic() {
            config = config.with_critic(model);
        }
        config
    }

    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.parse_orchestrator().1);
        issues.extend(self.parse_workers().1);
        issues.extend(self.parse_generator().1);
        issues.extend(self.parse_critic().1);
        issues
    }
}
