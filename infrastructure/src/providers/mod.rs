//! Completion service providers

pub mod openai;
