//! Agent descriptors and the role catalog.

use crate::tool::entities::ToolDefinition;
use crate::tool::retrieval::retrieval_tools;
use serde::{Deserialize, Serialize};

/// Knowledge domains covered by expert agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertDomain {
    /// Public-sector accessibility rules (RGAA)
    Accessibility,
    /// IFRS finance rules
    Finance,
    /// French accounting standards
    Accounting,
    /// Internal guidelines and directives of the organisation
    Guidelines,
    /// Business vocabulary and rules of the project's domain
    BusinessDomain,
}

impl ExpertDomain {
    pub const ALL: [ExpertDomain; 5] = [
        ExpertDomain::Accessibility,
        ExpertDomain::Finance,
        ExpertDomain::Accounting,
        ExpertDomain::Guidelines,
        ExpertDomain::BusinessDomain,
    ];

    pub fn agent_name(&self) -> &'static str {
        match self {
            ExpertDomain::Accessibility => "Accessibility_Expert",
            ExpertDomain::Finance => "Finance_Expert",
            ExpertDomain::Accounting => "Accounting_Expert",
            ExpertDomain::Guidelines => "Guidelines_Expert",
            ExpertDomain::BusinessDomain => "Business_Domain_Expert",
        }
    }

    /// Human-readable name of the reference the expert answers from.
    pub fn reference(&self) -> &'static str {
        match self {
            ExpertDomain::Accessibility => "the RGAA accessibility rules",
            ExpertDomain::Finance => "the IFRS finance rules",
            ExpertDomain::Accounting => "the French accounting standards",
            ExpertDomain::Guidelines => {
                "the organisation's internal guidelines (quality, CSR, security policies)"
            }
            ExpertDomain::BusinessDomain => {
                "the project's business domain knowledge and abbreviations"
            }
        }
    }
}

/// Fixed catalog of agent roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Orchestrator,
    ContextRetriever,
    ContextCritic,
    RelatedRequirementSynthesizer,
    RelatedRequirementCritic,
    AcceptanceCriteriaSynthesizer,
    /// Answers functional questions from the requirements knowledge graph
    RequirementKnowledge,
    /// Answers general project questions from the project-context graph
    ProjectContext,
    DomainExpert(ExpertDomain),
    CaseGenerator,
    CaseCritic,
}

impl AgentRole {
    /// Name an agent of this role gets unless overridden.
    pub fn default_name(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "Planner",
            AgentRole::ContextRetriever => "Context_Retrieval",
            AgentRole::ContextCritic => "Context_Retrieval_Critic",
            AgentRole::RelatedRequirementSynthesizer => "Related_Requirement_Synthesizer",
            AgentRole::RelatedRequirementCritic => "Related_Requirement_Critic",
            AgentRole::AcceptanceCriteriaSynthesizer => "Acceptance_Criteria_Synthesizer",
            AgentRole::RequirementKnowledge => "Requirement_Agent",
            AgentRole::ProjectContext => "Project_Context_Agent",
            AgentRole::DomainExpert(domain) => domain.agent_name(),
            AgentRole::CaseGenerator => "Test_Cases_Generator",
            AgentRole::CaseCritic => "Test_Cases_Critic",
        }
    }

    /// One-line description used when introducing the team to the orchestrator.
    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "Plans the work and decides who speaks next.",
            AgentRole::ContextRetriever => {
                "Gathers project context and explains unknown terms and abbreviations."
            }
            AgentRole::ContextCritic => "Scores and critiques the Context_Retrieval output.",
            AgentRole::RelatedRequirementSynthesizer => {
                "Finds related requirements and their acceptance criteria."
            }
            AgentRole::RelatedRequirementCritic => {
                "Scores and critiques the related-requirement synthesis."
            }
            AgentRole::AcceptanceCriteriaSynthesizer => {
                "Synthesizes detailed acceptance criteria and business rules."
            }
            AgentRole::RequirementKnowledge => {
                "Answers functional questions from the requirements knowledge graph."
            }
            AgentRole::ProjectContext => {
                "Answers general questions from the project-context knowledge graph."
            }
            AgentRole::DomainExpert(ExpertDomain::Accessibility) => {
                "Retrieves applicable accessibility (RGAA) rules."
            }
            AgentRole::DomainExpert(ExpertDomain::Finance) => {
                "Retrieves applicable finance (IFRS) rules."
            }
            AgentRole::DomainExpert(ExpertDomain::Accounting) => {
                "Retrieves applicable French accounting rules."
            }
            AgentRole::DomainExpert(ExpertDomain::Guidelines) => {
                "Retrieves applicable internal guidelines."
            }
            AgentRole::DomainExpert(ExpertDomain::BusinessDomain) => {
                "Retrieves business-domain knowledge."
            }
            AgentRole::CaseGenerator => "Writes the test cases.",
            AgentRole::CaseCritic => "Critiques test-case coverage against acceptance criteria.",
        }
    }

    pub fn is_orchestrator(&self) -> bool {
        matches!(self, AgentRole::Orchestrator)
    }

    pub fn is_critic(&self) -> bool {
        matches!(
            self,
            AgentRole::ContextCritic | AgentRole::RelatedRequirementCritic | AgentRole::CaseCritic
        )
    }

    /// Roles whose instructions are meaningless without the requirement text.
    pub fn requires_context(&self) -> bool {
        matches!(
            self,
            AgentRole::ContextRetriever
                | AgentRole::RelatedRequirementSynthesizer
                | AgentRole::AcceptanceCriteriaSynthesizer
                | AgentRole::DomainExpert(_)
                | AgentRole::CaseGenerator
                | AgentRole::CaseCritic
        )
    }

    /// Roles that answer from a knowledge graph.
    pub fn uses_retrieval(&self) -> bool {
        matches!(
            self,
            AgentRole::RequirementKnowledge | AgentRole::ProjectContext | AgentRole::DomainExpert(_)
        )
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Retrieval capability bound to one knowledge source of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalCapability {
    /// Knowledge graph name under the index root (e.g. "graph_us")
    pub knowledge_source: String,
    pub project_id: String,
}

impl RetrievalCapability {
    pub fn new(knowledge_source: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            knowledge_source: knowledge_source.into(),
            project_id: project_id.into(),
        }
    }
}

/// Requirement data interpolated into role instructions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContext {
    /// Requirement title and description
    pub requirement: String,
    pub acceptance_criteria: String,
    pub business_rules: String,
    /// Test data parameters (parameterised Gherkin only)
    pub parameters: String,
    pub project_id: String,
}

impl TaskContext {
    pub fn new(requirement: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            ..Default::default()
        }
    }

    pub fn with_acceptance_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.acceptance_criteria = criteria.into();
        self
    }

    pub fn with_business_rules(mut self, rules: impl Into<String>) -> Self {
        self.business_rules = rules.into();
        self
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn has_requirement(&self) -> bool {
        !self.requirement.trim().is_empty()
    }
}

/// An immutable agent descriptor.
///
/// Agents hold no conversational state; everything they said lives in the
/// transcript. They are rebuilt for every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub name: String,
    pub role: AgentRole,
    /// Fully resolved instructions (system prompt)
    pub role_instructions: String,
    pub capability: Option<RetrievalCapability>,
}

impl Agent {
    pub fn new(role: AgentRole, role_instructions: impl Into<String>) -> Self {
        Self {
            name: role.default_name().to_string(),
            role,
            role_instructions: role_instructions.into(),
            capability: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_capability(mut self, capability: RetrievalCapability) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Tool schema offered to this agent's completions.
    pub fn tools(&self) -> Vec<ToolDefinition> {
        if self.capability.is_some() {
            retrieval_tools()
        } else {
            Vec::new()
        }
    }
}
