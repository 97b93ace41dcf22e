//! Generation history port
//!
//! The history is an append-only list of successful generations, rewritten
//! in full after every task so an interrupted batch keeps what it finished.

use casegen_domain::HistoryEntry;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub trait HistoryStore: Send + Sync {
    /// Entries from earlier runs. A corrupted store reads as empty and is
    /// kept aside rather than overwritten.
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Replace the stored history with `entries`.
    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError>;
}

/// History kept in memory for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl HistoryStore for InMemoryHistory {
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self.entries())
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        if let Ok(mut stored) = self.entries.lock() {
            *stored = entries.to_vec();
        }
        Ok(())
    }
}
