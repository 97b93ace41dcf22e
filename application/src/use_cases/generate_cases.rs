//! Generate Cases use case
//!
//! One requirement, two conversations:
//!
//! 1. **Context assembly**: the orchestrator delegates to retrieval and
//!    synthesis agents; the last non-orchestrator, non-critic message is
//!    the assembled prompt.
//! 2. **Critique**: generator and critic (plus the optional accessibility
//!    expert) take turns on that prompt; the last message is the raw
//!    artifact (the generator's last draft when a score gate stopped the
//!    loop), which goes through output recovery.

use super::run_conversation::{
    ConversationError, ConversationInput, ConversationOutput, RunConversationUseCase,
};
use crate::config::GenerationParams;
use crate::ports::conversation_logger::TurnObserver;
use crate::ports::knowledge_retriever::KnowledgeRetriever;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::transcript_exporter::TranscriptExporter;
use casegen_domain::recovery::{self, validate_case_list};
use casegen_domain::{
    AgentRegistry, ModelConfig, OrchestratorPolicy, PhaseCosts, PromptTemplate, RecoveryResult,
    RoundRobinPolicy, TaskContext, TaskOutput, TerminationReason, Transcript,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors that can occur while generating the cases of one requirement
#[derive(Error, Debug)]
pub enum GenerateCasesError {
    #[error("Context assembly failed: {0}")]
    ContextAssemblyFailed(String),

    #[error("Test case generation failed: {0}")]
    GenerationFailed(String),

    #[error("Generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

/// Input for the GenerateCases use case
#[derive(Debug, Clone)]
pub struct GenerateCasesInput {
    /// Label used in transcript file names (usually the requirement id)
    pub label: String,
    pub task: TaskContext,
}

impl GenerateCasesInput {
    pub fn new(label: impl Into<String>, task: TaskContext) -> Self {
        Self {
            label: label.into(),
            task,
        }
    }
}

/// Output of the GenerateCases use case
#[derive(Debug)]
pub struct GenerateCasesOutput {
    pub output: TaskOutput,
    pub recovery: RecoveryResult,
    pub context_assembly: ConversationOutput,
    pub critique: ConversationOutput,
}

/// Use case for turning one requirement into test cases
pub struct GenerateCasesUseCase<G: LlmGateway + 'static, R: KnowledgeRetriever + 'static> {
    conversation: RunConversationUseCase<G, R>,
    registry: AgentRegistry,
    params: GenerationParams,
    exporter: Option<Arc<dyn TranscriptExporter>>,
    cancellation_token: Option<CancellationToken>,
}

impl<G, R> Clone for GenerateCasesUseCase<G, R>
where
    G: LlmGateway + 'static,
    R: KnowledgeRetriever + 'static,
{
    fn clone(&self) -> Self {
        Self {
            conversation: self.conversation.clone(),
            registry: self.registry.clone(),
            params: self.params.clone(),
            exporter: self.exporter.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<G: LlmGateway + 'static, R: KnowledgeRetriever + 'static> GenerateCasesUseCase<G, R> {
    pub fn new(
        gateway: Arc<G>,
        retriever: Arc<R>,
        models: ModelConfig,
        registry: AgentRegistry,
        params: GenerationParams,
    ) -> Self {
        let conversation = RunConversationUseCase::new(gateway, retriever, models)
            .with_max_tool_rounds(params.max_tool_rounds)
            .with_turn_timeout(params.turn_timeout);
        Self {
            conversation,
            registry,
            params,
            exporter: None,
            cancellation_token: None,
        }
    }

    /// Export both transcripts after each phase
    pub fn with_exporter(mut self, exporter: Arc<dyn TranscriptExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.conversation = self.conversation.with_observer(observer);
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.conversation = self.conversation.with_cancellation(token.clone());
        self.cancellation_token = Some(token);
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    pub async fn execute(
        &self,
        input: GenerateCasesInput,
    ) -> Result<GenerateCasesOutput, GenerateCasesError> {
        let GenerateCasesInput { label, task } = input;
        if self.is_cancelled() {
            return Err(GenerateCasesError::Cancelled);
        }

        // Phase 1: context assembly
        let team = self.registry.context_assembly_team(&task);
        let excluded: Vec<String> = team
            .iter()
            .filter(|a| a.role.is_orchestrator() || a.role.is_critic())
            .map(|a| a.name.clone())
            .collect();
        let orchestrator = team
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default();
        let context = self
            .conversation
            .execute(ConversationInput::new(
                "context_assembly",
                PromptTemplate::context_assembly_task(&task),
                team,
                self.params.context_max_turns,
                Box::new(OrchestratorPolicy::new(orchestrator)),
            ))
            .await?;
        self.export(&format!("{label}_context_assembly"), &context.transcript);

        if context.was_cancelled() {
            return Err(GenerateCasesError::Cancelled);
        }
        if context.successful_turns() == 0 {
            return Err(GenerateCasesError::ContextAssemblyFailed(
                context
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "no agent produced output".to_string()),
            ));
        }
        let excluded: Vec<&str> = excluded.iter().map(String::as_str).collect();
        let prompt = context.transcript.final_artifact(&excluded);
        info!(
            "[{}] context assembled in {} turns ({})",
            label, context.turns, context.termination
        );

        // Phase 2: critique loop
        let team = self.registry.critique_team(
            &task,
            self.params.output_format,
            self.params.with_accessibility_expert,
        );
        let full_prompt = format!("{}\n{}", team.generator.role_instructions, prompt);
        let reviewers: Vec<String> = team
            .speaking_order()
            .into_iter()
            .filter(|a| a.name != team.generator.name)
            .map(|a| a.name)
            .collect();
        let critique = self
            .conversation
            .execute(
                ConversationInput::new(
                    "generation",
                    PromptTemplate::critique_task(&prompt),
                    team.speaking_order(),
                    self.params.critique_rounds,
                    Box::new(RoundRobinPolicy),
                )
                .with_gate(self.params.critique_gate),
            )
            .await?;
        self.export(&format!("{label}_generation"), &critique.transcript);

        if critique.was_cancelled() {
            return Err(GenerateCasesError::Cancelled);
        }
        if critique.successful_turns() == 0 {
            return Err(GenerateCasesError::GenerationFailed(
                critique
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "no agent produced output".to_string()),
            ));
        }

        // A satisfied gate ends on the critic's turn; the draft it accepted
        // is the generator's last message.
        let raw = if critique.termination == TerminationReason::GateSatisfied {
            let reviewers: Vec<&str> = reviewers.iter().map(String::as_str).collect();
            critique.transcript.final_artifact(&reviewers)
        } else {
            critique.transcript.last_content()
        };
        let recovered = recovery::clean_text(&raw);
        debug!(
            "[{}] artifact recovered via {}",
            label, recovered.strategy_used
        );
        if recovered.is_wrapped() {
            warn!("[{}] artifact is not structured, kept as text", label);
        } else if !validate_case_list(&recovered.value) {
            debug!("[{}] artifact is not a detailed test case list", label);
        }
        info!(
            "[{}] cases generated in {} rounds ({})",
            label, critique.turns, critique.termination
        );

        let output = TaskOutput {
            prompt,
            full_prompt,
            artifact: recovered.artifact_text(),
            costs: PhaseCosts {
                context_assembly: Some(context.usage),
                generation: Some(critique.usage),
            },
        };

        Ok(GenerateCasesOutput {
            output,
            recovery: recovered,
            context_assembly: context,
            critique,
        })
    }

    fn export(&self, step_name: &str, transcript: &Transcript) {
        let Some(exporter) = &self.exporter else {
            return;
        };
        match exporter.export(step_name, transcript) {
            Ok(export) => debug!("Transcript '{}' exported to {:?}", step_name, export.text_path),
            Err(e) => error!("Failed to export transcript '{}': {}", step_name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::knowledge_retriever::NoRetriever;
    use crate::ports::llm_gateway::GatewayError;
    use crate::use_cases::test_support::{
        FailingExporter, PROJECT_CONTEXT, RecordingExporter, ScriptedGateway, pipeline_reply,
        task_text, text,
    };
    use casegen_domain::{CritiqueGate, RecoveryStrategy, TERMINATE_TOKEN, TerminationReason};

    fn use_case(
        gateway: Arc<ScriptedGateway>,
        params: GenerationParams,
    ) -> GenerateCasesUseCase<ScriptedGateway, NoRetriever> {
        GenerateCasesUseCase::new(
            gateway,
            Arc::new(NoRetriever),
            ModelConfig::default(),
            AgentRegistry::default(),
            params,
        )
    }

    fn input(requirement: &str) -> GenerateCasesInput {
        GenerateCasesInput::new(
            "PRJ-1",
            TaskContext::new(requirement)
                .with_acceptance_criteria("Wrong password is rejected")
                .with_project_id("PRJ"),
        )
    }

    #[tokio::test]
    async fn test_generates_recovered_cases() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let result = use_case(gateway.clone(), GenerationParams::default())
            .execute(input("User can log in"))
            .await
            .unwrap();

        // planner, retriever, planner, synthesizer
        assert_eq!(result.context_assembly.turns, 4);
        assert_eq!(
            result.context_assembly.termination,
            TerminationReason::TurnBudgetExhausted
        );
        assert!(result.output.prompt.starts_with("Prompt: You synthesize"));
        assert!(result.output.prompt.contains("User can log in"));

        // generator, critic, generator
        assert_eq!(result.critique.turns, 3);
        assert_eq!(result.recovery.strategy_used, RecoveryStrategy::BracketExtracted);
        assert_eq!(
            result.output.artifact,
            "[\n  {\n    \"Test_Id\": \"TC1\"\n  }\n]"
        );
        assert!(result.output.full_prompt.starts_with("You generate test cases."));
        assert!(result.output.full_prompt.ends_with(&result.output.prompt));
        assert_eq!(result.output.costs.summary(), "105 tokens");

        // the critique opens on the assembled prompt
        let generator_request = gateway
            .requests()
            .into_iter()
            .find(|r| r.instructions.starts_with("You generate test cases"))
            .unwrap();
        assert!(task_text(&generator_request).starts_with(&result.output.prompt));
    }

    #[tokio::test]
    async fn test_assembled_prompt_combines_worker_findings() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let params = GenerationParams::default().with_context_max_turns(8);
        let result = use_case(gateway, params)
            .execute(input("User can log in"))
            .await
            .unwrap();

        // the planner closes with TERMINATE once the synthesizer has answered
        assert_eq!(result.context_assembly.turns, 5);
        assert_eq!(
            result.context_assembly.termination,
            TerminationReason::TerminateToken
        );
        let prompt = &result.output.prompt;
        assert!(prompt.starts_with("Prompt: You synthesize"));
        assert!(prompt.contains("User can log in"));
        assert!(prompt.contains(PROJECT_CONTEXT));
        assert!(!prompt.contains("Planner"));
        assert!(!prompt.contains(TERMINATE_TOKEN));
    }

    #[tokio::test]
    async fn test_score_gate_keeps_the_accepted_draft() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let params = GenerationParams::default()
            .with_critique_rounds(6)
            .with_critique_gate(CritiqueGate::ScoreThreshold(5.0));
        let result = use_case(gateway, params)
            .execute(input("User can log in"))
            .await
            .unwrap();

        assert_eq!(result.critique.turns, 2);
        assert_eq!(result.critique.termination, TerminationReason::GateSatisfied);
        // the critic accepted the generator's draft, which is the artifact
        assert_eq!(result.recovery.strategy_used, RecoveryStrategy::BracketExtracted);
        assert!(result.output.artifact.contains("Test_Id"));
        assert!(!result.output.artifact.contains("Score"));
    }

    #[tokio::test]
    async fn test_fixed_rounds_artifact_is_the_last_message() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let params = GenerationParams::default().with_critique_rounds(2);
        let result = use_case(gateway, params)
            .execute(input("User can log in"))
            .await
            .unwrap();

        assert_eq!(result.critique.termination, TerminationReason::TurnBudgetExhausted);
        assert_eq!(result.recovery.strategy_used, RecoveryStrategy::WrappedAsString);
        assert_eq!(result.output.artifact, "Add negative cases. Score: 6/10");
    }

    #[tokio::test]
    async fn test_accessibility_expert_speaks_first() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let params = GenerationParams::default().with_accessibility_expert(true);
        let result = use_case(gateway, params)
            .execute(input("User can log in"))
            .await
            .unwrap();

        let first = &result.critique.transcript.chronological()[1];
        assert_eq!(first.source, "Accessibility_Expert");
    }

    #[tokio::test]
    async fn test_orchestrator_failure_fails_context_phase() {
        let gateway = Arc::new(ScriptedGateway::new(|_| {
            Err(GatewayError::ConnectionError("refused".to_string()))
        }));
        let exporter = Arc::new(RecordingExporter::default());
        let result = use_case(gateway, GenerationParams::default())
            .with_exporter(exporter.clone())
            .execute(input("User can log in"))
            .await;

        match result {
            Err(GenerateCasesError::ContextAssemblyFailed(message)) => {
                assert_eq!(message, "Connection error: refused")
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // the failed phase is still exported
        assert_eq!(
            *exporter.steps.lock().unwrap(),
            vec!["PRJ-1_context_assembly".to_string()]
        );
    }

    #[tokio::test]
    async fn test_all_critique_turns_failing_is_an_error() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, Some("BROKEN"))));
        let result = use_case(gateway, GenerationParams::default())
            .execute(input("BROKEN requirement"))
            .await;
        assert!(matches!(result, Err(GenerateCasesError::GenerationFailed(_))));
    }

    #[tokio::test]
    async fn test_both_phases_exported() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let exporter = Arc::new(RecordingExporter::default());
        use_case(gateway, GenerationParams::default())
            .with_exporter(exporter.clone())
            .execute(input("User can log in"))
            .await
            .unwrap();
        assert_eq!(
            *exporter.steps.lock().unwrap(),
            vec![
                "PRJ-1_context_assembly".to_string(),
                "PRJ-1_generation".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_export_failure_does_not_propagate() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let result = use_case(gateway, GenerationParams::default())
            .with_exporter(Arc::new(FailingExporter))
            .execute(input("User can log in"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let gateway = Arc::new(ScriptedGateway::new(|_| text("x")));
        let token = CancellationToken::new();
        token.cancel();
        let result = use_case(gateway.clone(), GenerationParams::default())
            .with_cancellation(token)
            .execute(input("User can log in"))
            .await;
        assert!(matches!(result, Err(GenerateCasesError::Cancelled)));
        assert!(gateway.requests().is_empty());
    }
}
