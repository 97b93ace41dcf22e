//! Batch result sinks

mod json_columns;

pub use json_columns::JsonColumnSink;
