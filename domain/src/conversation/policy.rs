//! Speaker selection policies.

use super::transcript::Transcript;
use crate::agent::entities::Agent;
use std::sync::Arc;

/// Outcome of one selection tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Name of the participant that speaks next
    Speak(String),
    Stop,
}

/// Chooses the next speaker from the transcript so far.
///
/// Policies are pure: same transcript, same answer.
pub trait SelectionPolicy: Send + Sync {
    fn select(&self, transcript: &Transcript, participants: &[Arc<Agent>]) -> Selection;
}

/// Orchestrator-centred selection used for context assembly.
///
/// The orchestrator speaks after every other agent. After the orchestrator
/// speaks, the participant it names first in its output speaks next; if
/// it names nobody the conversation stops. Two non-orchestrator agents
/// therefore never speak back to back.
#[derive(Debug, Clone)]
pub struct OrchestratorPolicy {
    orchestrator: String,
}

impl OrchestratorPolicy {
    pub fn new(orchestrator: impl Into<String>) -> Self {
        Self {
            orchestrator: orchestrator.into(),
        }
    }

    pub fn orchestrator(&self) -> &str {
        &self.orchestrator
    }
}

impl SelectionPolicy for OrchestratorPolicy {
    fn select(&self, transcript: &Transcript, participants: &[Arc<Agent>]) -> Selection {
        let Some(last) = transcript.last_spoken() else {
            return Selection::Speak(self.orchestrator.clone());
        };
        if last.source != self.orchestrator {
            return Selection::Speak(self.orchestrator.clone());
        }

        let content = last.text_content();
        participants
            .iter()
            .filter(|p| p.name != self.orchestrator)
            .filter_map(|p| first_mention(&content, &p.name).map(|pos| (pos, p.name.as_str())))
            // earliest mention wins; on a tie the longer name is the real one
            .min_by(|(pa, na), (pb, nb)| pa.cmp(pb).then(nb.len().cmp(&na.len())))
            .map(|(_, name)| Selection::Speak(name.to_string()))
            .unwrap_or(Selection::Stop)
    }
}

/// Fixed-order rotation through the participants, starting with the first.
#[derive(Debug, Clone, Default)]
pub struct RoundRobinPolicy;

impl SelectionPolicy for RoundRobinPolicy {
    fn select(&self, transcript: &Transcript, participants: &[Arc<Agent>]) -> Selection {
        if participants.is_empty() {
            return Selection::Stop;
        }
        let next = transcript
            .last_spoken()
            .and_then(|last| participants.iter().position(|p| p.name == last.source))
            .map(|i| (i + 1) % participants.len())
            .unwrap_or(0);
        Selection::Speak(participants[next].name.clone())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset of the first whole-word occurrence of `name` in `text`.
fn first_mention(text: &str, name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    text.match_indices(name).map(|(i, _)| i).find(|&i| {
        let before_ok = text[..i].chars().next_back().is_none_or(|c| !is_name_char(c));
        let after_ok = text[i + name.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_name_char(c));
        before_ok && after_ok
    })
}
