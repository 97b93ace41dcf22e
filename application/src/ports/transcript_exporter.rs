//! Transcript export port
//!
//! After each conversation phase the transcript is written out for
//! auditing. Export never affects the outcome of a task: callers log
//! failures and move on.

use casegen_domain::Transcript;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Files written by one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptExport {
    /// Human-readable transcript
    pub text_path: PathBuf,
    /// Machine-readable record
    pub json_path: PathBuf,
}

pub trait TranscriptExporter: Send + Sync {
    fn export(&self, step_name: &str, transcript: &Transcript)
    -> Result<TranscriptExport, ExportError>;
}
