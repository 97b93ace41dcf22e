//! Hand-written fakes shared by the use case tests.

use crate::ports::conversation_logger::TurnObserver;
use crate::ports::knowledge_retriever::{KnowledgeRetriever, RetrievalError};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::transcript_exporter::{ExportError, TranscriptExport, TranscriptExporter};
use async_trait::async_trait;
use casegen_domain::{
    ChatTurn, CompletionRequest, ContentBlock, LlmResponse, Message, RetrievalCapability,
    RetrievalMode, StopReason, TERMINATE_TOKEN, TokenUsage, Transcript,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

type Reply = Box<dyn Fn(&CompletionRequest) -> Result<LlmResponse, GatewayError> + Send + Sync>;

/// Gateway answering through a closure and recording every request.
pub(crate) struct ScriptedGateway {
    reply: Reply,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<LlmResponse, GatewayError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.reply)(request)
    }
}

/// Text reply carrying token usage.
pub(crate) fn text(content: &str) -> Result<LlmResponse, GatewayError> {
    let mut response = LlmResponse::from_text(content);
    response.usage = Some(TokenUsage {
        prompt_tokens: 10,
        completion_tokens: 5,
    });
    Ok(response)
}

/// Reply requesting one retrieval tool call.
pub(crate) fn tool_use(id: &str, tool: &str, query: &str) -> Result<LlmResponse, GatewayError> {
    Ok(LlmResponse {
        content: vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: tool.to_string(),
            input: HashMap::from([("query_text".to_string(), serde_json::json!(query))]),
        }],
        stop_reason: Some(StopReason::ToolUse),
        model: None,
        usage: None,
    })
}

/// Whether the request history carries a tool result.
pub(crate) fn has_tool_result(request: &CompletionRequest) -> bool {
    request
        .history
        .iter()
        .any(|turn| matches!(turn, ChatTurn::ToolResult { .. }))
}

/// Text of the first history entry (the task message).
pub(crate) fn task_text(request: &CompletionRequest) -> String {
    match request.history.first() {
        Some(ChatTurn::User { content, .. }) => content.clone(),
        _ => String::new(),
    }
}

/// Scripted replies for a whole generation, keyed on the role instructions.
///
/// The planner sends Context_Retrieval for project context, then asks the
/// acceptance criteria synthesizer for the final prompt, then terminates.
/// The synthesizer answers with its own instructions (so the requirement
/// flows into the assembled prompt) followed by every other member's
/// findings. The generator answers with a fenced case list, the critic
/// with a scored review. Generator and critic fail when the task message
/// contains `fail_marker`.
pub(crate) fn pipeline_reply(
    request: &CompletionRequest,
    fail_marker: Option<&str>,
) -> Result<LlmResponse, GatewayError> {
    let instructions = request.instructions.as_str();
    let critique_role = instructions.starts_with("You generate test cases")
        || instructions.starts_with("You critique");
    if critique_role && fail_marker.is_some_and(|marker| task_text(request).contains(marker)) {
        return Err(GatewayError::RequestFailed("service unavailable".to_string()));
    }

    if instructions.starts_with("You plan the actions") {
        let spoken = request
            .history
            .iter()
            .filter(|turn| matches!(turn, ChatTurn::Assistant { .. }))
            .count();
        match spoken {
            0 => text("Context_Retrieval, gather the project context."),
            1 => text("Acceptance_Criteria_Synthesizer, write the final prompt."),
            _ => text(TERMINATE_TOKEN),
        }
    } else if instructions.starts_with("You are a context retriever") {
        text(PROJECT_CONTEXT)
    } else if instructions.starts_with("You synthesize the acceptance") {
        let findings: Vec<&str> = request
            .history
            .iter()
            .filter_map(|turn| match turn {
                ChatTurn::User {
                    name: Some(name),
                    content,
                } if name != "Planner" => Some(content.as_str()),
                _ => None,
            })
            .collect();
        text(&format!("Prompt: {instructions}\n{}", findings.join("\n")))
    } else if instructions.starts_with("You generate test cases") {
        text(GENERATED_CASES)
    } else if instructions.starts_with("You critique") {
        text("Add negative cases. Score: 6/10")
    } else {
        text("expert notes")
    }
}

pub(crate) const PROJECT_CONTEXT: &str = "Project context: retail banking portal.";
pub(crate) const GENERATED_CASES: &str = "```json\n[{\"Test_Id\": \"TC1\"}]\n```";

/// Exporter recording step names.
#[derive(Default)]
pub(crate) struct RecordingExporter {
    pub steps: Mutex<Vec<String>>,
}

impl TranscriptExporter for RecordingExporter {
    fn export(
        &self,
        step_name: &str,
        _transcript: &Transcript,
    ) -> Result<TranscriptExport, ExportError> {
        self.steps.lock().unwrap().push(step_name.to_string());
        Ok(TranscriptExport {
            text_path: PathBuf::from(format!("{step_name}.txt")),
            json_path: PathBuf::from(format!("{step_name}.json")),
        })
    }
}

pub(crate) struct FailingExporter;

impl TranscriptExporter for FailingExporter {
    fn export(
        &self,
        _step_name: &str,
        _transcript: &Transcript,
    ) -> Result<TranscriptExport, ExportError> {
        Err(ExportError::Io(std::io::Error::other("disk full")))
    }
}

/// Retriever answering every query with a fixed text.
pub(crate) struct FakeRetriever {
    pub answer: Result<String, RetrievalError>,
    pub queries: Mutex<Vec<(String, RetrievalMode, String)>>,
}

impl FakeRetriever {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RetrievalError) -> Self {
        Self {
            answer: Err(error),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl KnowledgeRetriever for FakeRetriever {
    async fn query(
        &self,
        capability: &RetrievalCapability,
        mode: RetrievalMode,
        query_text: &str,
    ) -> Result<String, RetrievalError> {
        self.queries.lock().unwrap().push((
            capability.knowledge_source.clone(),
            mode,
            query_text.to_string(),
        ));
        self.answer.clone()
    }
}

/// Observer recording `(conversation, index, source)` of every message.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub messages: Mutex<Vec<(String, usize, String)>>,
    pub ended: Mutex<Vec<String>>,
}

impl TurnObserver for RecordingObserver {
    fn on_message(&self, conversation: &str, index: usize, message: &Message) {
        self.messages.lock().unwrap().push((
            conversation.to_string(),
            index,
            message.source.clone(),
        ));
    }

    fn on_conversation_end(
        &self,
        conversation: &str,
        _reason: casegen_domain::TerminationReason,
        _turns: usize,
    ) {
        self.ended.lock().unwrap().push(conversation.to_string());
    }
}
