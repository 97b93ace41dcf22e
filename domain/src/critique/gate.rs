//! Quality gate for the critique loop.

use crate::conversation::message::Message;
use serde::{Deserialize, Serialize};

/// Decides whether the critique loop may stop before its round budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum CritiqueGate {
    /// Always run every round; scores are informational.
    #[default]
    FixedRounds,
    /// Stop once a critic scores the latest draft at or above the threshold.
    ScoreThreshold(f64),
}

impl CritiqueGate {
    /// Build from an optional configured threshold.
    pub fn from_threshold(threshold: Option<f64>) -> Self {
        match threshold {
            Some(t) => CritiqueGate::ScoreThreshold(t.clamp(0.0, 10.0)),
            None => CritiqueGate::FixedRounds,
        }
    }

    /// Whether `message` (just recorded) satisfies the gate.
    pub fn is_satisfied_by(&self, message: &Message) -> bool {
        match self {
            CritiqueGate::FixedRounds => false,
            CritiqueGate::ScoreThreshold(threshold) => {
                message.score.is_some_and(|score| score >= *threshold)
            }
        }
    }
}
