//! Wire types and conversions for the chat completions API
//!
//! Converts domain completion requests into the JSON request body and the
//! JSON response back into a domain `LlmResponse`.

use casegen_application::GatewayError;
use casegen_domain::{
    ChatTurn, CompletionRequest, ContentBlock, LlmResponse, StopReason, TokenUsage,
    ToolDefinition,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

// ─── Request ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Reasoning models take this instead of `max_tokens`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatTool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            name: None,
            tool_call_id: None,
            tool_calls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded argument object
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize)]
pub struct ChatTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: ChatToolFunction,
}

#[derive(Debug, Serialize)]
pub struct ChatToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

// ─── Response ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}

// ─── Domain → Wire ───────────────────────────────────────────────

/// The `name` field only accepts `[a-zA-Z0-9_-]`, at most 64 chars.
fn participant_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

pub fn convert_turn(turn: &ChatTurn) -> ChatMessage {
    match turn {
        ChatTurn::User { name, content } => ChatMessage {
            name: name.as_deref().map(participant_name),
            ..ChatMessage::new("user", content.clone())
        },
        ChatTurn::Assistant {
            content,
            tool_calls,
        } => {
            if tool_calls.is_empty() {
                return ChatMessage::new("assistant", content.clone());
            }
            let calls = tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call
                        .native_id
                        .clone()
                        .unwrap_or_else(|| call.tool_name.clone()),
                    call_type: function_type(),
                    function: WireFunctionCall {
                        name: call.tool_name.clone(),
                        arguments: call.arguments_json(),
                    },
                })
                .collect();
            ChatMessage {
                content: (!content.is_empty()).then(|| content.clone()),
                tool_calls: Some(calls),
                ..ChatMessage::new("assistant", "")
            }
        }
        ChatTurn::ToolResult { call_id, content } => ChatMessage {
            tool_call_id: Some(call_id.clone()),
            ..ChatMessage::new("tool", content.clone())
        },
    }
}

pub fn convert_tool(tool: &ToolDefinition) -> ChatTool {
    ChatTool {
        tool_type: "function",
        function: ChatToolFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema(),
        },
    }
}

/// Build the request body for one agent turn.
pub fn build_request(request: &CompletionRequest, max_tokens: u32) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.history.len() + 1);
    if !request.instructions.is_empty() {
        messages.push(ChatMessage::new("system", request.instructions.clone()));
    }
    messages.extend(request.history.iter().map(convert_turn));

    let tools = (!request.tools.is_empty())
        .then(|| request.tools.iter().map(convert_tool).collect());

    let reasoning = request.model.is_reasoning();
    ChatRequest {
        model: request.model.to_string(),
        messages,
        max_tokens: (!reasoning).then_some(max_tokens),
        max_completion_tokens: reasoning.then_some(max_tokens),
        temperature: None,
        tools,
    }
}

// ─── Wire → Domain ───────────────────────────────────────────────

/// Decode a tool call's JSON argument string. Malformed arguments decode
/// as an empty map so the call still reaches the tool and gets an answer.
fn parse_arguments(call: &WireToolCall) -> HashMap<String, serde_json::Value> {
    if call.function.arguments.trim().is_empty() {
        return HashMap::new();
    }
    match serde_json::from_str::<serde_json::Value>(&call.function.arguments) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        Ok(_) | Err(_) => {
            warn!(
                tool = %call.function.name,
                "Tool call arguments are not a JSON object, ignoring them"
            );
            HashMap::new()
        }
    }
}

pub fn convert_response(response: ChatResponse) -> Result<LlmResponse, GatewayError> {
    let usage = response.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
    });
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::InvalidResponse("response has no choices".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content
        && !text.is_empty()
    {
        content.push(ContentBlock::Text(text));
    }
    for call in choice.message.tool_calls.unwrap_or_default() {
        let input = parse_arguments(&call);
        content.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    Ok(LlmResponse {
        content,
        stop_reason: choice
            .finish_reason
            .as_deref()
            .map(StopReason::from_finish_reason),
        model: response.model,
        usage,
    })
}

/// Map a non-success HTTP status to a gateway error.
pub fn status_error(status: u16, body: &str, model: &str) -> GatewayError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| casegen_domain::core::string::truncate(body.trim(), 300));

    match status {
        401 | 403 => GatewayError::ConnectionError(format!("authentication failed: {detail}")),
        404 => GatewayError::ModelNotAvailable(format!("{model}: {detail}")),
        408 | 504 => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(format!("HTTP {status}: {detail}")),
    }
}
