//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording conversation events
//! (conversation start, each appended message, termination) to a structured log,
//! and the [`TurnObserver`] hook the scheduler calls for every message.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! conversation transcript in a machine-readable format (JSONL).

use casegen_domain::{Message, TerminationReason};
use serde_json::{Value, json};
use std::sync::Arc;

/// A structured conversation event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The logger adds the timestamp.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "conversation_start", "message").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// The `log` method is synchronous and non-fallible: logging failures never
/// reach the scheduler.
pub trait ConversationLogger: Send + Sync {
    /// Record a conversation event.
    fn log(&self, event: ConversationEvent);
}

/// Notified of every message appended to a conversation transcript.
///
/// Observers cannot fail and cannot influence scheduling.
pub trait TurnObserver: Send + Sync {
    fn on_conversation_start(&self, _conversation: &str, _participants: &[&str]) {}

    fn on_message(&self, conversation: &str, index: usize, message: &Message);

    fn on_conversation_end(
        &self,
        _conversation: &str,
        _reason: TerminationReason,
        _turns: usize,
    ) {
    }
}

/// Forwards transcript activity to a [`ConversationLogger`].
pub struct LoggingTurnObserver {
    logger: Arc<dyn ConversationLogger>,
}

impl LoggingTurnObserver {
    pub fn new(logger: Arc<dyn ConversationLogger>) -> Self {
        Self { logger }
    }
}

impl TurnObserver for LoggingTurnObserver {
    fn on_conversation_start(&self, conversation: &str, participants: &[&str]) {
        self.logger.log(ConversationEvent::new(
            "conversation_start",
            json!({
                "conversation": conversation,
                "participants": participants,
            }),
        ));
    }

    fn on_message(&self, conversation: &str, index: usize, message: &Message) {
        let tool_calls: Vec<String> = message.tool_calls.iter().map(ToString::to_string).collect();
        self.logger.log(ConversationEvent::new(
            "message",
            json!({
                "conversation": conversation,
                "index": index,
                "source": message.source,
                "kind": message.kind.as_str(),
                "content": message.text_content(),
                "tool_calls": tool_calls,
                "score": message.score,
                "sent_at": message
                    .timestamp
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            }),
        ));
    }

    fn on_conversation_end(&self, conversation: &str, reason: TerminationReason, turns: usize) {
        self.logger.log(ConversationEvent::new(
            "conversation_end",
            json!({
                "conversation": conversation,
                "reason": reason.as_str(),
                "turns": turns,
            }),
        ));
    }
}
