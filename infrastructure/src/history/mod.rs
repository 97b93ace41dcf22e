//! Generation history persistence

mod json_history;

pub use json_history::JsonHistoryStore;
