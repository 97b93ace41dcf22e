//! Batch domain: requirement records and aligned batch results.

pub mod record;
pub mod result;

pub use record::RequirementRecord;
pub use result::{
    BatchResult, HistoryEntry, HistoryMetadata, PhaseCosts, TaskOutput, TaskRow, columns,
};
