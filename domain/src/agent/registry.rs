//! Agent registry: builds agent descriptors for one task.

use super::entities::{Agent, AgentRole, ExpertDomain, RetrievalCapability, TaskContext};
use crate::config::OutputFormat;
use crate::prompt::PromptTemplate;
use serde::{Deserialize, Serialize};

/// Knowledge graph names for every retrieval role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSources {
    pub requirements: String,
    pub project_context: String,
    pub accessibility: String,
    pub finance: String,
    pub accounting: String,
    pub guidelines: String,
    pub business_domain: String,
}

impl Default for KnowledgeSources {
    fn default() -> Self {
        Self {
            requirements: "graph_us".to_string(),
            project_context: "graph_context".to_string(),
            accessibility: "expert_rgaa".to_string(),
            finance: "expert_finance".to_string(),
            accounting: "expert_accounting".to_string(),
            guidelines: "graph_guidelines".to_string(),
            business_domain: "graph_business_domain".to_string(),
        }
    }
}

impl KnowledgeSources {
    pub fn for_expert(&self, domain: ExpertDomain) -> &str {
        match domain {
            ExpertDomain::Accessibility => &self.accessibility,
            ExpertDomain::Finance => &self.finance,
            ExpertDomain::Accounting => &self.accounting,
            ExpertDomain::Guidelines => &self.guidelines,
            ExpertDomain::BusinessDomain => &self.business_domain,
        }
    }
}

/// Participants of the artifact-generation phase.
#[derive(Debug, Clone)]
pub struct CritiqueTeam {
    pub generator: Agent,
    pub critics: Vec<Agent>,
    /// Optional domain expert speaking before the generator
    pub expert: Option<Agent>,
}

impl CritiqueTeam {
    /// Round-robin speaking order: expert, generator, then critics.
    pub fn speaking_order(&self) -> Vec<Agent> {
        self.expert
            .iter()
            .chain(std::iter::once(&self.generator))
            .chain(self.critics.iter())
            .cloned()
            .collect()
    }
}

/// Builds immutable agents from task parameters.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    knowledge: KnowledgeSources,
}

impl AgentRegistry {
    pub fn new(knowledge: KnowledgeSources) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeSources {
        &self.knowledge
    }

    /// Define one agent.
    ///
    /// Retrieval roles given no capability get the default knowledge source
    /// for their role bound to the task's project. Context-dependent roles
    /// defined with an empty requirement are told to ask for clarification.
    pub fn define(
        &self,
        role: AgentRole,
        task: &TaskContext,
        capability: Option<RetrievalCapability>,
    ) -> Agent {
        let capability = capability.or_else(|| self.default_capability(role, task));

        let mut instructions = match role {
            AgentRole::Orchestrator => PromptTemplate::orchestrator(&[]),
            AgentRole::ContextRetriever => PromptTemplate::context_retriever(task),
            AgentRole::ContextCritic => PromptTemplate::context_critic().to_string(),
            AgentRole::RelatedRequirementSynthesizer => {
                let experts: Vec<&str> = ExpertDomain::ALL
                    .iter()
                    .filter(|d| **d != ExpertDomain::Accessibility)
                    .map(|d| d.agent_name())
                    .collect();
                PromptTemplate::related_requirement_synthesizer(task, &experts)
            }
            AgentRole::RelatedRequirementCritic => {
                PromptTemplate::related_requirement_critic().to_string()
            }
            AgentRole::AcceptanceCriteriaSynthesizer => {
                PromptTemplate::acceptance_criteria_synthesizer(task)
            }
            AgentRole::RequirementKnowledge => match &capability {
                Some(cap) => PromptTemplate::requirement_knowledge(cap),
                None => PromptTemplate::requirement_knowledge(&self.bind(
                    &self.knowledge.requirements,
                    task,
                )),
            },
            AgentRole::ProjectContext => match &capability {
                Some(cap) => PromptTemplate::project_context(cap),
                None => PromptTemplate::project_context(
                    &self.bind(&self.knowledge.project_context, task),
                ),
            },
            AgentRole::DomainExpert(domain) => match &capability {
                Some(cap) => PromptTemplate::domain_expert(domain, task, cap),
                None => PromptTemplate::domain_expert(
                    domain,
                    task,
                    &self.bind(self.knowledge.for_expert(domain), task),
                ),
            },
            AgentRole::CaseGenerator => {
                PromptTemplate::case_generator(OutputFormat::default(), &task.parameters)
            }
            AgentRole::CaseCritic => PromptTemplate::case_critic(task),
        };

        if role.requires_context() && !task.has_requirement() {
            instructions.push_str("\n\n");
            instructions.push_str(PromptTemplate::clarification_notice());
        }

        let agent = Agent::new(role, instructions);
        match capability {
            Some(cap) => agent.with_capability(cap),
            None => agent,
        }
    }

    /// Full context-assembly participant set, orchestrator first.
    pub fn context_assembly_team(&self, task: &TaskContext) -> Vec<Agent> {
        let mut members: Vec<Agent> = [
            AgentRole::RequirementKnowledge,
            AgentRole::ProjectContext,
            AgentRole::ContextRetriever,
            AgentRole::ContextCritic,
            AgentRole::RelatedRequirementSynthesizer,
            AgentRole::RelatedRequirementCritic,
            AgentRole::AcceptanceCriteriaSynthesizer,
        ]
        .into_iter()
        .chain(ExpertDomain::ALL.into_iter().map(AgentRole::DomainExpert))
        .map(|role| self.define(role, task, None))
        .collect();

        let roster: Vec<(String, &'static str)> = members
            .iter()
            .map(|a| (a.name.clone(), a.role.description()))
            .collect();
        let orchestrator = Agent::new(
            AgentRole::Orchestrator,
            PromptTemplate::orchestrator(&roster),
        );

        members.insert(0, orchestrator);
        members
    }

    /// Generator and critic for the artifact-generation phase, plus the
    /// accessibility expert when requested.
    pub fn critique_team(
        &self,
        task: &TaskContext,
        format: OutputFormat,
        with_expert: bool,
    ) -> CritiqueTeam {
        let parameters = if format.uses_parameters() {
            task.parameters.as_str()
        } else {
            ""
        };

        let mut generator_instructions = PromptTemplate::case_generator(format, parameters);
        if !task.has_requirement() {
            generator_instructions.push_str("\n\n");
            generator_instructions.push_str(PromptTemplate::clarification_notice());
        }
        let generator = Agent::new(AgentRole::CaseGenerator, generator_instructions);

        let critic = self.define(AgentRole::CaseCritic, task, None);
        let expert = with_expert.then(|| {
            self.define(
                AgentRole::DomainExpert(ExpertDomain::Accessibility),
                task,
                None,
            )
        });

        CritiqueTeam {
            generator,
            critics: vec![critic],
            expert,
        }
    }

    fn default_capability(
        &self,
        role: AgentRole,
        task: &TaskContext,
    ) -> Option<RetrievalCapability> {
        let source = match role {
            AgentRole::RequirementKnowledge => &self.knowledge.requirements,
            AgentRole::ProjectContext => &self.knowledge.project_context,
            AgentRole::DomainExpert(domain) => self.knowledge.for_expert(domain),
            _ => return None,
        };
        Some(self.bind(source, task))
    }

    fn bind(&self, source: &str, task: &TaskContext) -> RetrievalCapability {
        RetrievalCapability::new(source, task.project_id.clone())
    }
}
