//! Completion request types.

use crate::core::model::Model;
use crate::tool::entities::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};

/// One entry of the history sent with a completion request, seen from the
/// perspective of the agent being prompted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatTurn {
    /// Anything said by someone other than the prompted agent
    User {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        content: String,
    },
    /// The prompted agent's own earlier output
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one of the prompted agent's tool calls
    ToolResult { call_id: String, content: String },
}

impl ChatTurn {
    pub fn user(name: Option<&str>, content: impl Into<String>) -> Self {
        ChatTurn::User {
            name: name.map(str::to_string),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatTurn::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Everything the completion service needs for one agent turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: Model,
    /// Fully resolved role instructions (system prompt)
    pub instructions: String,
    pub history: Vec<ChatTurn>,
    /// Tool schema; empty for agents without a capability
    pub tools: Vec<ToolDefinition>,
}

impl CompletionRequest {
    pub fn new(model: Model, instructions: impl Into<String>) -> Self {
        Self {
            model,
            instructions: instructions.into(),
            history: Vec::new(),
            tools: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}
