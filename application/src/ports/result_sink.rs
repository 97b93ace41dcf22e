//! Result sink port
//!
//! Receives the batch results as named columns once the batch is done.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Column '{column}' has {found} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        found: usize,
        expected: usize,
    },
}

pub trait ResultSink: Send + Sync {
    /// Write the columns and return where they went.
    fn write(&self, columns: &BTreeMap<String, Vec<String>>) -> Result<PathBuf, SinkError>;
}
