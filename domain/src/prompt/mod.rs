//! Prompt domain
//!
//! Role instructions and conversation task texts.

mod template;

pub use template::{PromptTemplate, unresolved_placeholders};
