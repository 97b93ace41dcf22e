//! Knowledge retrieval port
//!
//! Agents with a retrieval capability query a project knowledge graph.
//! The query engine is a black box returning text.

use async_trait::async_trait;
use casegen_domain::{RetrievalCapability, RetrievalMode};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Knowledge index not found: {0}")]
    IndexNotFound(String),

    #[error("Retrieval timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to launch retrieval command: {0}")]
    Launch(String),

    #[error("Retrieval command failed ({status}): {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("Retrieval not configured")]
    NotConfigured,
}

/// Query a knowledge source bound to a capability.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn query(
        &self,
        capability: &RetrievalCapability,
        mode: RetrievalMode,
        query_text: &str,
    ) -> Result<String, RetrievalError>;
}

/// Retriever for runs without a knowledge index.
pub struct NoRetriever;

#[async_trait]
impl KnowledgeRetriever for NoRetriever {
    async fn query(
        &self,
        _capability: &RetrievalCapability,
        _mode: RetrievalMode,
        _query_text: &str,
    ) -> Result<String, RetrievalError> {
        Err(RetrievalError::NotConfigured)
    }
}
