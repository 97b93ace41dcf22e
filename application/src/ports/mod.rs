//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_logger;
pub mod history_store;
pub mod knowledge_retriever;
pub mod llm_gateway;
pub mod progress;
pub mod result_sink;
pub mod transcript_exporter;
