//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod generate_cases;
pub mod run_batch;
pub mod run_conversation;

#[cfg(test)]
mod test_support;
