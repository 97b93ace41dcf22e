//! Durable transcript exports

mod export;

pub use export::FileTranscriptExporter;
