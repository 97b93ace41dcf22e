//! Conversation domain
//!
//! Messages, the transcript that owns them, speaker selection policies,
//! and the bounded conversation state machine.

pub mod message;
pub mod policy;
pub mod state;
pub mod transcript;
