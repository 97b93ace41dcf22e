//! Run Conversation use case
//!
//! Drives a [`Conversation`] turn by turn: the selection policy names a
//! speaker, the speaker's turn is completed through the gateway (running
//! any retrieval tool calls it makes), the reply is recorded, and the loop
//! repeats until the conversation terminates.
//!
//! Failure handling per turn:
//!
//! | Speaker          | Gateway error or timeout            |
//! |------------------|-------------------------------------|
//! | Orchestrator     | conversation ends early             |
//! | Any other agent  | `Error: ...` placeholder is recorded |
//!
//! Cancellation is honoured at turn and tool-round boundaries.

use crate::ports::conversation_logger::TurnObserver;
use crate::ports::knowledge_retriever::KnowledgeRetriever;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use casegen_domain::core::string::truncate;
use casegen_domain::{
    Agent, ChatTurn, CompletionRequest, Conversation, CritiqueGate, DomainError, LlmResponse,
    Message, ModelConfig, RetrievalRequest, SelectionPolicy, TerminationReason, TokenUsage,
    ToolCall, Transcript, USER_SOURCE, parse_critic_score,
};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur while running a conversation
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Invalid conversation: {0}")]
    Domain(#[from] DomainError),
}

/// Input for the RunConversation use case
pub struct ConversationInput {
    /// Name used for logs, observers and exports (e.g. "context_assembly")
    pub name: String,
    /// Opening task message
    pub task: String,
    pub participants: Vec<Agent>,
    pub max_turns: usize,
    pub policy: Box<dyn SelectionPolicy>,
    pub gate: CritiqueGate,
}

impl ConversationInput {
    pub fn new(
        name: impl Into<String>,
        task: impl Into<String>,
        participants: Vec<Agent>,
        max_turns: usize,
        policy: Box<dyn SelectionPolicy>,
    ) -> Self {
        Self {
            name: name.into(),
            task: task.into(),
            participants,
            max_turns,
            policy,
            gate: CritiqueGate::FixedRounds,
        }
    }

    pub fn with_gate(mut self, gate: CritiqueGate) -> Self {
        self.gate = gate;
        self
    }
}

/// Output of a finished conversation
#[derive(Debug)]
pub struct ConversationOutput {
    pub transcript: Transcript,
    pub turns: usize,
    pub termination: TerminationReason,
    /// Tokens spent across all turns
    pub usage: TokenUsage,
    /// Turns recorded as error placeholders
    pub failed_turns: usize,
    pub last_error: Option<String>,
}

impl ConversationOutput {
    pub fn successful_turns(&self) -> usize {
        self.turns.saturating_sub(self.failed_turns)
    }

    pub fn was_cancelled(&self) -> bool {
        self.termination == TerminationReason::Cancelled
    }
}

enum TurnError {
    Gateway(GatewayError),
    Cancelled,
    Domain(DomainError),
}

impl From<DomainError> for TurnError {
    fn from(e: DomainError) -> Self {
        TurnError::Domain(e)
    }
}

/// Use case for running one bounded multi-agent conversation
pub struct RunConversationUseCase<G: LlmGateway + 'static, R: KnowledgeRetriever + 'static> {
    gateway: Arc<G>,
    retriever: Arc<R>,
    models: ModelConfig,
    max_tool_rounds: usize,
    turn_timeout: Option<Duration>,
    observers: Vec<Arc<dyn TurnObserver>>,
    cancellation_token: Option<CancellationToken>,
}

impl<G, R> Clone for RunConversationUseCase<G, R>
where
    G: LlmGateway + 'static,
    R: KnowledgeRetriever + 'static,
{
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            retriever: self.retriever.clone(),
            models: self.models.clone(),
            max_tool_rounds: self.max_tool_rounds,
            turn_timeout: self.turn_timeout,
            observers: self.observers.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<G: LlmGateway + 'static, R: KnowledgeRetriever + 'static> RunConversationUseCase<G, R> {
    pub fn new(gateway: Arc<G>, retriever: Arc<R>, models: ModelConfig) -> Self {
        Self {
            gateway,
            retriever,
            models,
            max_tool_rounds: 3,
            turn_timeout: None,
            observers: Vec::new(),
            cancellation_token: None,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Run the conversation to termination.
    pub async fn execute(
        &self,
        input: ConversationInput,
    ) -> Result<ConversationOutput, ConversationError> {
        let ConversationInput {
            name,
            task,
            participants,
            max_turns,
            policy,
            gate,
        } = input;

        let participants = participants.into_iter().map(Arc::new).collect();
        let mut conversation = Conversation::new(task, participants, max_turns, policy)?;

        {
            let names: Vec<&str> = conversation
                .participants()
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            info!(
                "Conversation '{}' started: {} participants, max {} turns",
                name,
                names.len(),
                max_turns
            );
            for observer in &self.observers {
                observer.on_conversation_start(&name, &names);
            }
        }
        self.notify(&name, 0, conversation.transcript());

        let mut usage = TokenUsage::default();
        let mut failed_turns = 0;
        let mut last_error = None;

        loop {
            if self.is_cancelled() {
                conversation.terminate(TerminationReason::Cancelled);
                break;
            }
            let Some(speaker) = conversation.next_speaker() else {
                break;
            };
            debug!(
                "'{}' turn {}: {} speaks",
                name,
                conversation.turn_count() + 1,
                speaker.name
            );

            match self
                .take_turn(&name, &mut conversation, &speaker, &mut usage)
                .await
            {
                Ok(reply) => {
                    let score = if speaker.role.is_critic() {
                        parse_critic_score(&reply)
                    } else {
                        None
                    };
                    let message = Message::text(speaker.name.clone(), reply).with_score(score);
                    let gate_met = speaker.role.is_critic() && gate.is_satisfied_by(&message);
                    let index = conversation.record_turn(message)?;
                    self.notify(&name, index, conversation.transcript());
                    if gate_met && conversation.is_running() {
                        info!(
                            "'{}': {} scored {:?}, quality gate satisfied",
                            name, speaker.name, score
                        );
                        conversation.terminate(TerminationReason::GateSatisfied);
                    }
                }
                Err(TurnError::Cancelled) => {
                    conversation.terminate(TerminationReason::Cancelled);
                    break;
                }
                Err(TurnError::Domain(e)) => return Err(e.into()),
                Err(TurnError::Gateway(e)) => {
                    last_error = Some(e.to_string());
                    if speaker.role.is_orchestrator() {
                        warn!(
                            "'{}': orchestrator {} failed ({}), ending conversation",
                            name, speaker.name, e
                        );
                        conversation.terminate(TerminationReason::OrchestratorFailed);
                        break;
                    }
                    warn!(
                        "'{}': {} failed ({}), recording placeholder",
                        name, speaker.name, e
                    );
                    failed_turns += 1;
                    let placeholder = Message::text(speaker.name.clone(), format!("Error: {e}"));
                    let index = conversation.record_turn(placeholder)?;
                    self.notify(&name, index, conversation.transcript());
                }
            }
        }

        let termination = conversation
            .termination_reason()
            .unwrap_or(TerminationReason::PolicyStop);
        let turns = conversation.turn_count();
        info!(
            "Conversation '{}' ended after {} turns ({})",
            name, turns, termination
        );
        for observer in &self.observers {
            observer.on_conversation_end(&name, termination, turns);
        }

        Ok(ConversationOutput {
            transcript: conversation.into_transcript(),
            turns,
            termination,
            usage,
            failed_turns,
            last_error,
        })
    }

    /// Complete one turn of `speaker`, running its tool calls until it
    /// answers in text. Tool traffic is recorded as asides.
    async fn take_turn(
        &self,
        conversation_name: &str,
        conversation: &mut Conversation,
        speaker: &Agent,
        usage: &mut TokenUsage,
    ) -> Result<String, TurnError> {
        let mut request = CompletionRequest::new(
            self.models.model_for(speaker.role).clone(),
            speaker.role_instructions.clone(),
        )
        .with_history(history_for(conversation.transcript(), &speaker.name))
        .with_tools(speaker.tools());

        let mut round = 0;
        loop {
            if self.is_cancelled() {
                return Err(TurnError::Cancelled);
            }
            // Last round: no tools offered, the agent has to answer
            if round >= self.max_tool_rounds {
                request.tools.clear();
            }

            let response = self.complete(&request).await.map_err(TurnError::Gateway)?;
            if let Some(spent) = response.usage {
                *usage += spent;
            }

            let calls = response.tool_calls();
            let text = response.text_content();
            if calls.is_empty() || request.tools.is_empty() {
                return Ok(text);
            }

            debug!(
                "{} requested {} tool call(s) (round {})",
                speaker.name,
                calls.len(),
                round + 1
            );
            let index =
                conversation.record_aside(Message::tool_call(speaker.name.clone(), calls.clone()))?;
            self.notify(conversation_name, index, conversation.transcript());
            request.history.push(ChatTurn::Assistant {
                content: text,
                tool_calls: calls.clone(),
            });

            let outputs = join_all(calls.iter().map(|call| self.run_tool(speaker, call))).await;
            for (call, output) in calls.into_iter().zip(outputs) {
                let call_id = call
                    .native_id
                    .clone()
                    .unwrap_or_else(|| call.tool_name.clone());
                let index = conversation.record_aside(Message::tool_result(
                    speaker.name.clone(),
                    call,
                    output.clone(),
                ))?;
                self.notify(conversation_name, index, conversation.transcript());
                request.history.push(ChatTurn::ToolResult {
                    call_id,
                    content: output,
                });
            }
            round += 1;
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, GatewayError> {
        match self.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, self.gateway.complete(request))
                .await
                .map_err(|_| GatewayError::Timeout)?,
            None => self.gateway.complete(request).await,
        }
    }

    /// Run one retrieval tool call. Failures become `Error: ...` text that
    /// the agent sees as the tool result.
    async fn run_tool(&self, speaker: &Agent, call: &ToolCall) -> String {
        let Some(request) = RetrievalRequest::from_call(call) else {
            return format!("Error: unknown tool '{}'", call.tool_name);
        };
        let Some(capability) = speaker.capability.as_ref() else {
            return format!("Error: {} has no knowledge source", speaker.name);
        };

        debug!(
            "{} queries {} ({}): {}",
            speaker.name,
            capability.knowledge_source,
            request.mode,
            truncate(&request.query_text, 80)
        );
        match self
            .retriever
            .query(capability, request.mode, &request.query_text)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(
                    "Retrieval for {} from {} failed: {}",
                    speaker.name, capability.knowledge_source, e
                );
                format!("Error: {e}")
            }
        }
    }

    fn notify(&self, conversation: &str, index: usize, transcript: &Transcript) {
        if let Some(message) = transcript.get(index) {
            for observer in &self.observers {
                observer.on_message(conversation, index, message);
            }
        }
    }
}

/// History as seen by `agent`: its own messages as assistant turns, every
/// other message as a named user turn. Tool traffic of earlier turns is
/// left out.
pub(crate) fn history_for(transcript: &Transcript, agent: &str) -> Vec<ChatTurn> {
    transcript
        .chronological()
        .iter()
        .filter(|m| !m.is_tool_traffic())
        .map(|m| {
            if m.source == agent {
                ChatTurn::assistant(m.text_content())
            } else if m.source == USER_SOURCE {
                ChatTurn::user(None, m.text_content())
            } else {
                ChatTurn::user(Some(&m.source), m.text_content())
            }
        })
        .collect()
}
