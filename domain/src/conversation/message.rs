//! Transcript messages.

use crate::tool::entities::ToolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved content that ends a conversation early.
pub const TERMINATE_TOKEN: &str = "TERMINATE";

/// Source name of the task message that opens every conversation.
pub const USER_SOURCE: &str = "user";

/// What a message represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    ToolCall,
    ToolResult,
    /// Content equal to [`TERMINATE_TOKEN`]
    Terminal,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::ToolCall => "tool_call",
            MessageKind::ToolResult => "tool_result",
            MessageKind::Terminal => "terminal",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message body: plain text or an already structured value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Structured(serde_json::Value),
}

impl MessageContent {
    /// Text form; structured values are rendered as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Structured(v) => v.to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s),
            MessageContent::Structured(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(s) => s.trim().is_empty(),
            MessageContent::Structured(v) => v.is_null(),
        }
    }

    /// Raw value handed to output recovery.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            MessageContent::Text(s) => serde_json::Value::String(s.clone()),
            MessageContent::Structured(v) => v.clone(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

impl From<serde_json::Value> for MessageContent {
    fn from(v: serde_json::Value) -> Self {
        MessageContent::Structured(v)
    }
}

/// `true` when `content` is exactly the termination token (surrounding
/// whitespace ignored).
pub fn is_termination_token(content: &str) -> bool {
    content.trim() == TERMINATE_TOKEN
}

/// An immutable transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Agent name, or [`USER_SOURCE`] for the task message
    pub source: String,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Critic quality score (0-10), when one could be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Message {
    /// A text message. Content equal to the termination token is marked
    /// [`MessageKind::Terminal`].
    pub fn text(source: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        let content = content.into();
        let kind = match content.as_text() {
            Some(text) if is_termination_token(text) => MessageKind::Terminal,
            _ => MessageKind::Text,
        };
        Self {
            source: source.into(),
            content,
            timestamp: Utc::now(),
            kind,
            tool_calls: Vec::new(),
            score: None,
        }
    }

    /// The task message opening a conversation.
    pub fn task(content: impl Into<String>) -> Self {
        Self::text(USER_SOURCE, content.into())
    }

    /// Tool invocations requested by an agent.
    pub fn tool_call(source: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        let summary = calls
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            source: source.into(),
            content: MessageContent::Text(summary),
            timestamp: Utc::now(),
            kind: MessageKind::ToolCall,
            tool_calls: calls,
            score: None,
        }
    }

    /// Result of one tool invocation, attributed to the calling agent.
    pub fn tool_result(
        source: impl Into<String>,
        call: ToolCall,
        output: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            content: MessageContent::Text(output.into()),
            timestamp: Utc::now(),
            kind: MessageKind::ToolResult,
            tool_calls: vec![call],
            score: None,
        }
    }

    pub fn with_score(mut self, score: Option<f64>) -> Self {
        self.score = score;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == MessageKind::Terminal
    }

    /// Tool traffic is provenance only; it never counts as a turn.
    pub fn is_tool_traffic(&self) -> bool {
        matches!(self.kind, MessageKind::ToolCall | MessageKind::ToolResult)
    }

    pub fn text_content(&self) -> String {
        self.content.to_text()
    }
}
