//! Knowledge retrieval adapters

mod graph_cli;

pub use graph_cli::GraphCliRetriever;
