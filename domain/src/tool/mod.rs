//! Tool domain: definitions, calls, and the knowledge-retrieval tool pair.

pub mod entities;
pub mod retrieval;
