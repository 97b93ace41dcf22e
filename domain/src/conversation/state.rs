//! Conversation state machine.
//!
//! ```text
//! Running ──(turn budget spent | policy Stop | TERMINATE | abort)──▶ Terminated
//! ```
//!
//! The state machine never calls a model itself. The driver asks for the
//! next speaker, produces the message, and records it.

use super::message::Message;
use super::policy::{Selection, SelectionPolicy};
use super::transcript::Transcript;
use crate::agent::entities::Agent;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Why a conversation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    TurnBudgetExhausted,
    PolicyStop,
    TerminateToken,
    /// Quality gate satisfied early
    GateSatisfied,
    /// The orchestrator's own turn failed
    OrchestratorFailed,
    Cancelled,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::TurnBudgetExhausted => "turn budget exhausted",
            TerminationReason::PolicyStop => "policy stop",
            TerminationReason::TerminateToken => "terminate token",
            TerminationReason::GateSatisfied => "quality gate satisfied",
            TerminationReason::OrchestratorFailed => "orchestrator failed",
            TerminationReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Running,
    Terminated(TerminationReason),
}

/// One bounded run of turn-taking among a fixed set of agents.
pub struct Conversation {
    participants: Vec<Arc<Agent>>,
    max_turns: usize,
    policy: Box<dyn SelectionPolicy>,
    turn_count: usize,
    state: ConversationState,
    transcript: Transcript,
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field(
                "participants",
                &self.participants.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            )
            .field("max_turns", &self.max_turns)
            .field("turn_count", &self.turn_count)
            .field("state", &self.state)
            .field("messages", &self.transcript.len())
            .finish()
    }
}

impl Conversation {
    /// Create a conversation whose transcript opens with the task message.
    pub fn new(
        task: impl Into<String>,
        participants: Vec<Arc<Agent>>,
        max_turns: usize,
        policy: Box<dyn SelectionPolicy>,
    ) -> Result<Self, DomainError> {
        if participants.is_empty() {
            return Err(DomainError::NoParticipants);
        }
        if max_turns == 0 {
            return Err(DomainError::ZeroTurnBudget);
        }
        let mut seen = HashSet::new();
        for p in &participants {
            if !seen.insert(p.name.as_str()) {
                return Err(DomainError::DuplicateParticipant(p.name.clone()));
            }
        }

        let mut transcript = Transcript::new();
        transcript.append(Message::task(task));

        Ok(Self {
            participants,
            max_turns,
            policy,
            turn_count: 0,
            state: ConversationState::Running,
            transcript,
        })
    }

    pub fn participants(&self) -> &[Arc<Agent>] {
        &self.participants
    }

    pub fn participant(&self, name: &str) -> Option<&Arc<Agent>> {
        self.participants.iter().find(|p| p.name == name)
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ConversationState::Running
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        match self.state {
            ConversationState::Running => None,
            ConversationState::Terminated(reason) => Some(reason),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Select the next speaker, or terminate.
    ///
    /// Returns `None` once the conversation is (or has just become)
    /// terminated.
    pub fn next_speaker(&mut self) -> Option<Arc<Agent>> {
        if !self.is_running() {
            return None;
        }
        if self.turn_count >= self.max_turns {
            self.terminate(TerminationReason::TurnBudgetExhausted);
            return None;
        }
        match self.policy.select(&self.transcript, &self.participants) {
            Selection::Speak(name) => match self.participant(&name) {
                Some(agent) => Some(Arc::clone(agent)),
                None => {
                    self.terminate(TerminationReason::PolicyStop);
                    None
                }
            },
            Selection::Stop => {
                self.terminate(TerminationReason::PolicyStop);
                None
            }
        }
    }

    /// Record the message that completes a turn and return its index.
    ///
    /// Terminates the conversation when the message is the termination
    /// token or the turn budget is now spent.
    pub fn record_turn(&mut self, message: Message) -> Result<usize, DomainError> {
        if !self.is_running() {
            return Err(DomainError::AlreadyTerminated);
        }
        if message.source != super::message::USER_SOURCE
            && self.participant(&message.source).is_none()
        {
            return Err(DomainError::UnknownParticipant(message.source));
        }

        let terminal = message.is_terminal();
        let index = self.transcript.append(message);
        self.turn_count += 1;

        if terminal {
            self.terminate(TerminationReason::TerminateToken);
        } else if self.turn_count >= self.max_turns {
            self.terminate(TerminationReason::TurnBudgetExhausted);
        }
        Ok(index)
    }

    /// Record tool traffic inside the current turn. Does not count as a turn.
    pub fn record_aside(&mut self, message: Message) -> Result<usize, DomainError> {
        if !self.is_running() {
            return Err(DomainError::AlreadyTerminated);
        }
        Ok(self.transcript.append(message))
    }

    /// Freeze the conversation. The first reason wins.
    pub fn terminate(&mut self, reason: TerminationReason) {
        if self.is_running() {
            self.state = ConversationState::Terminated(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::entities::AgentRole;
    use crate::conversation::policy::{OrchestratorPolicy, RoundRobinPolicy};

    fn agents(names: &[&str]) -> Vec<Arc<Agent>> {
        names
            .iter()
            .map(|n| Arc::new(Agent::new(AgentRole::CaseGenerator, "x").with_name(*n)))
            .collect()
    }

    fn drive(conv: &mut Conversation, reply: impl Fn(&Agent, usize) -> String) {
        while let Some(speaker) = conv.next_speaker() {
            let text = reply(&speaker, conv.turn_count());
            conv.record_turn(Message::text(speaker.name.clone(), text)).unwrap();
        }
    }

    #[test]
    fn test_construction_validates() {
        assert!(matches!(
            Conversation::new("t", vec![], 3, Box::new(RoundRobinPolicy)),
            Err(DomainError::NoParticipants)
        ));
        assert!(matches!(
            Conversation::new("t", agents(&["a"]), 0, Box::new(RoundRobinPolicy)),
            Err(DomainError::ZeroTurnBudget)
        ));
        assert!(matches!(
            Conversation::new("t", agents(&["a", "a"]), 2, Box::new(RoundRobinPolicy)),
            Err(DomainError::DuplicateParticipant(_))
        ));
    }

    #[test]
    fn test_never_stopping_policy_runs_exactly_max_turns() {
        let mut conv =
            Conversation::new("task", agents(&["gen", "critic"]), 3, Box::new(RoundRobinPolicy))
                .unwrap();
        drive(&mut conv, |a, i| format!("{} turn {}", a.name, i));

        assert_eq!(conv.turn_count(), 3);
        assert_eq!(
            conv.termination_reason(),
            Some(TerminationReason::TurnBudgetExhausted)
        );
        // task message + 3 turns
        assert_eq!(conv.transcript().len(), 4);
        assert!(conv.next_speaker().is_none());
    }

    #[test]
    fn test_terminate_token_ends_early() {
        let mut conv =
            Conversation::new("task", agents(&["gen", "critic"]), 10, Box::new(RoundRobinPolicy))
                .unwrap();
        drive(&mut conv, |_, i| {
            if i == 1 { "TERMINATE".to_string() } else { "draft".to_string() }
        });
        assert_eq!(conv.turn_count(), 2);
        assert_eq!(conv.termination_reason(), Some(TerminationReason::TerminateToken));
    }

    #[test]
    fn test_policy_stop_terminates() {
        let mut conv = Conversation::new(
            "task",
            agents(&["Planner", "Worker"]),
            10,
            Box::new(OrchestratorPolicy::new("Planner")),
        )
        .unwrap();
        drive(&mut conv, |a, _| {
            if a.name == "Planner" { "All done, final prompt.".into() } else { "work".into() }
        });
        assert_eq!(conv.turn_count(), 1);
        assert_eq!(conv.termination_reason(), Some(TerminationReason::PolicyStop));
    }

    #[test]
    fn test_recording_after_termination_fails() {
        let mut conv =
            Conversation::new("task", agents(&["a"]), 1, Box::new(RoundRobinPolicy)).unwrap();
        conv.record_turn(Message::text("a", "one")).unwrap();
        assert!(!conv.is_running());
        assert!(matches!(
            conv.record_turn(Message::text("a", "two")),
            Err(DomainError::AlreadyTerminated)
        ));
    }

    #[test]
    fn test_asides_do_not_count_as_turns() {
        let mut conv =
            Conversation::new("task", agents(&["a"]), 2, Box::new(RoundRobinPolicy)).unwrap();
        conv.record_aside(Message::tool_call("a", vec![])).unwrap();
        assert_eq!(conv.turn_count(), 0);
        assert_eq!(conv.transcript().len(), 2);
    }

    #[test]
    fn test_unknown_source_rejected() {
        let mut conv =
            Conversation::new("task", agents(&["a"]), 2, Box::new(RoundRobinPolicy)).unwrap();
        assert!(matches!(
            conv.record_turn(Message::text("ghost", "boo")),
            Err(DomainError::UnknownParticipant(_))
        ));
    }

    #[test]
    fn test_first_termination_reason_wins() {
        let mut conv =
            Conversation::new("task", agents(&["a"]), 2, Box::new(RoundRobinPolicy)).unwrap();
        conv.terminate(TerminationReason::Cancelled);
        conv.terminate(TerminationReason::PolicyStop);
        assert_eq!(conv.termination_reason(), Some(TerminationReason::Cancelled));
    }
}
