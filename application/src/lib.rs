//! Application layer for casegen
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::GenerationParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, LoggingTurnObserver, TurnObserver},
    history_store::{HistoryError, HistoryStore, InMemoryHistory},
    knowledge_retriever::{KnowledgeRetriever, NoRetriever, RetrievalError},
    llm_gateway::{GatewayError, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
    result_sink::{ResultSink, SinkError},
    transcript_exporter::{ExportError, TranscriptExport, TranscriptExporter},
};
pub use use_cases::generate_cases::{
    GenerateCasesError, GenerateCasesInput, GenerateCasesOutput, GenerateCasesUseCase,
};
pub use use_cases::run_batch::{BatchError, RunBatchInput, RunBatchUseCase};
pub use use_cases::run_conversation::{
    ConversationError, ConversationInput, ConversationOutput, RunConversationUseCase,
};
