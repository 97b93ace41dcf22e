//! Role-based model configuration.
//!
//! [`ModelConfig`] groups the model selections for the different agent
//! roles. It is a static value object: once created, models don't change.

use super::entities::AgentRole;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Role-based model configuration.
///
/// - **Orchestrator**: the planner steering context assembly
/// - **Workers**: retrievers, synthesizers, knowledge and expert agents
/// - **Generator**: the test-case writer
/// - **Critic**: every critic agent
///
/// # Example
///
/// ```
/// use casegen_domain::agent::model_config::ModelConfig;
/// use casegen_domain::{AgentRole, Model};
///
/// let config = ModelConfig::default().with_generator(Model::Gpt4o);
/// assert_eq!(config.model_for(AgentRole::CaseGenerator), &Model::Gpt4o);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub orchestrator: Model,
    pub workers: Model,
    pub generator: Model,
    pub critic: Model,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            orchestrator: Model::Gpt4oMini,
            workers: Model::Gpt4oMini,
            generator: Model::Gpt4oMini,
            critic: Model::Gpt4oMini,
        }
    }
}

impl ModelConfig {
    pub fn with_orchestrator(mut self, model: Model) -> Self {
        self.orchestrator = model;
        self
    }

    pub fn with_workers(mut self, model: Model) -> Self {
        self.workers = model;
        self
    }

    pub fn with_generator(mut self, model: Model) -> Self {
        self.generator = model;
        self
    }

    pub fn with_critic(mut self, model: Model) -> Self {
        self.critic = model;
        self
    }

    /// Model an agent of `role` completes with.
    pub fn model_for(&self, role: AgentRole) -> &Model {
        match role {
            AgentRole::Orchestrator => &self.orchestrator,
            AgentRole::CaseGenerator => &self.generator,
            r if r.is_critic() => &self.critic,
            _ => &self.workers,
        }
    }
}
