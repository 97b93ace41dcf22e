//! Requirement file loading

mod loader;

pub use loader::{RequirementsError, load_requirements, parse_requirements};
