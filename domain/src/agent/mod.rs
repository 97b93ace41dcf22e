//! Agent domain
//!
//! - [`entities`]: agent descriptors, the role catalog, task context
//! - [`registry`]: builds the agents of a task's two conversations
//! - [`model_config`]: which model each role completes with

pub mod entities;
pub mod model_config;
pub mod registry;
