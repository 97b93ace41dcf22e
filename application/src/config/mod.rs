//! Application-level configuration.
//!
//! - [`GenerationParams`]: conversation budgets, output format, batching

pub mod generation_params;

pub use generation_params::GenerationParams;
