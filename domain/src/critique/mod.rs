//! Critique domain: critic score parsing and the early-stop gate.

pub mod gate;
pub mod score;
