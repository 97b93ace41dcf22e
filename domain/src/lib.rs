//! Domain layer for casegen
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Conversations
//!
//! Test cases are produced by agents talking in two bounded conversations:
//!
//! - **Context assembly**: an orchestrator delegates to retrieval and
//!   synthesis agents until a generation prompt is assembled
//! - **Critique**: a generator drafts test cases, critics (and optionally a
//!   domain expert) review them for a fixed number of rounds
//!
//! ## Output recovery
//!
//! Model output is free text. [`recovery::clean`] extracts structured values
//! from it and reports which strategy succeeded.

pub mod agent;
pub mod batch;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod core;
pub mod critique;
pub mod prompt;
pub mod recovery;
pub mod tool;

// Re-export commonly used types
pub use agent::{
    entities::{Agent, AgentRole, ExpertDomain, RetrievalCapability, TaskContext},
    model_config::ModelConfig,
    registry::{AgentRegistry, CritiqueTeam, KnowledgeSources},
};
pub use batch::{
    BatchResult, HistoryEntry, HistoryMetadata, PhaseCosts, RequirementRecord, TaskOutput, TaskRow,
};
pub use completion::{
    request::{ChatTurn, CompletionRequest},
    response::{ContentBlock, LlmResponse, StopReason, TokenUsage},
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use conversation::{
    message::{Message, MessageContent, MessageKind, TERMINATE_TOKEN, USER_SOURCE},
    policy::{OrchestratorPolicy, RoundRobinPolicy, Selection, SelectionPolicy},
    state::{Conversation, ConversationState, TerminationReason},
    transcript::{NO_RESULT, Transcript},
};
pub use core::{error::DomainError, model::Model};
pub use critique::{gate::CritiqueGate, score::parse_critic_score};
pub use prompt::PromptTemplate;
pub use recovery::{RecoveryError, RecoveryResult, RecoveryStrategy};
pub use tool::{
    entities::{ToolCall, ToolDefinition, ToolParameter},
    retrieval::{RetrievalMode, RetrievalRequest},
};
