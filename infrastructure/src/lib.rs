//! Infrastructure layer for casegen
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod history;
pub mod logging;
pub mod providers;
pub mod requirements;
pub mod retrieval;
pub mod sink;
pub mod transcript;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use history::JsonHistoryStore;
pub use logging::JsonlConversationLogger;
pub use providers::openai::{OpenAiConfig, OpenAiGateway};
pub use requirements::{RequirementsError, load_requirements};
pub use retrieval::GraphCliRetriever;
pub use sink::JsonColumnSink;
pub use transcript::FileTranscriptExporter;
