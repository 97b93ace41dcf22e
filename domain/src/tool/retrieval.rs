//! Knowledge-retrieval tools exposed to agents bound to a knowledge source.
//!
//! The knowledge source and project id are fixed when the agent is defined;
//! the model only chooses the query mode (via the tool name) and the text.

use super::entities::{ToolCall, ToolDefinition, ToolParameter};
use serde::{Deserialize, Serialize};

pub const LOCAL_QUERY_TOOL: &str = "run_local_query";
pub const GLOBAL_QUERY_TOOL: &str = "run_global_query";
pub const QUERY_TEXT_ARG: &str = "query_text";

/// Query mode understood by the knowledge graph tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Entity-centric search around the query
    Local,
    /// Community-summary search over the whole graph
    Global,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Local => "local",
            RetrievalMode::Global => "global",
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            RetrievalMode::Local => LOCAL_QUERY_TOOL,
            RetrievalMode::Global => GLOBAL_QUERY_TOOL,
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            LOCAL_QUERY_TOOL => Some(RetrievalMode::Local),
            GLOBAL_QUERY_TOOL => Some(RetrievalMode::Global),
            _ => None,
        }
    }
}

impl std::fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieval request decoded from a model's tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub mode: RetrievalMode,
    pub query_text: String,
}

impl RetrievalRequest {
    /// Decode a tool call. Returns `None` for tools that are not retrieval
    /// tools; a missing query text decodes as an empty query.
    pub fn from_call(call: &ToolCall) -> Option<Self> {
        let mode = RetrievalMode::from_tool_name(&call.tool_name)?;
        let query_text = match call.arguments.get(QUERY_TEXT_ARG) {
            Some(serde_json::Value::String(s)) => s.clone(),
            // Models sometimes send a list of questions
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join("\n"),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Some(Self { mode, query_text })
    }
}

/// Tool schema handed to every agent holding a retrieval capability.
pub fn retrieval_tools() -> Vec<ToolDefinition> {
    [RetrievalMode::Local, RetrievalMode::Global]
        .into_iter()
        .map(|mode| {
            let description = match mode {
                RetrievalMode::Local => {
                    "Query the knowledge graph for specific entities and their relationships"
                }
                RetrievalMode::Global => {
                    "Query the knowledge graph for broad, cross-document summaries"
                }
            };
            ToolDefinition::new(mode.tool_name(), description).with_parameter(ToolParameter::new(
                QUERY_TEXT_ARG,
                "Natural-language question to ask the knowledge graph",
                true,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_tool_name() {
        assert_eq!(
            RetrievalMode::from_tool_name("run_local_query"),
            Some(RetrievalMode::Local)
        );
        assert_eq!(
            RetrievalMode::from_tool_name("run_global_query"),
            Some(RetrievalMode::Global)
        );
        assert_eq!(RetrievalMode::from_tool_name("read_file"), None);
    }

    #[test]
    fn test_request_from_call() {
        let call = ToolCall::new(GLOBAL_QUERY_TOOL).with_arg(QUERY_TEXT_ARG, "What is KYC?");
        let req = RetrievalRequest::from_call(&call).unwrap();
        assert_eq!(req.mode, RetrievalMode::Global);
        assert_eq!(req.query_text, "What is KYC?");
    }

    #[test]
    fn test_request_joins_question_lists() {
        let call = ToolCall::new(LOCAL_QUERY_TOOL)
            .with_arg(QUERY_TEXT_ARG, serde_json::json!(["first?", "second?"]));
        let req = RetrievalRequest::from_call(&call).unwrap();
        assert_eq!(req.query_text, "first?\nsecond?");
    }

    #[test]
    fn test_unknown_tool_is_not_a_request() {
        assert!(RetrievalRequest::from_call(&ToolCall::new("save_excel")).is_none());
    }

    #[test]
    fn test_retrieval_tools_schema() {
        let tools = retrieval_tools();
        assert_eq!(tools.len(), 2);
        assert!(tools.iter().all(|t| t.parameters[0].name == QUERY_TEXT_ARG));
    }
}
