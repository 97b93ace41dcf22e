//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: chat-completion models agents are bound to
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod string;
