//! OpenAI-compatible chat completions provider
//!
//! Speaks the `/v1/chat/completions` wire format, which is also served by
//! most self-hosted inference servers. Every agent turn is one stateless
//! request carrying the full history.

mod gateway;
mod types;

pub use gateway::{OpenAiConfig, OpenAiGateway};
