//! Run Batch use case
//!
//! Generates test cases for every requirement record of a batch. Tasks run
//! on a bounded pool; each result lands at the index of its record, so the
//! four result sequences stay aligned whatever the completion order.
//! A failed task yields diagnostic placeholders instead of aborting the
//! batch. Successful tasks are appended to the generation history as they
//! finish, through a single writer task.

use super::generate_cases::{GenerateCasesError, GenerateCasesInput, GenerateCasesUseCase};
use crate::ports::history_store::HistoryStore;
use crate::ports::knowledge_retriever::KnowledgeRetriever;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::result_sink::ResultSink;
use casegen_domain::batch::result::DEFAULT_SOURCE;
use casegen_domain::{
    BatchResult, HistoryEntry, HistoryMetadata, RequirementRecord, TaskOutput, TaskRow,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Errors that abort a batch
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    #[error(
        "Result sequences misaligned: expected {expected} entries, found {found:?} (prompts, full prompts, artifacts, costs)"
    )]
    Misaligned { expected: usize, found: [usize; 4] },
}

/// Input for the RunBatch use case
#[derive(Debug, Clone)]
pub struct RunBatchInput {
    pub records: Vec<RequirementRecord>,
    /// Project whose knowledge sources the agents query
    pub project_id: String,
    /// Recorded in history metadata
    pub source: String,
}

impl RunBatchInput {
    pub fn new(records: Vec<RequirementRecord>, project_id: impl Into<String>) -> Self {
        Self {
            records,
            project_id: project_id.into(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

enum TaskOutcome {
    Completed(TaskOutput),
    Failed(String),
    Cancelled,
}

impl TaskOutcome {
    fn into_row(self, index: usize) -> TaskRow {
        match self {
            TaskOutcome::Completed(output) => TaskRow::completed(&output),
            TaskOutcome::Failed(error) => TaskRow::failed(index, &error),
            TaskOutcome::Cancelled => TaskRow::cancelled(),
        }
    }
}

/// Use case for running a whole batch of requirements
pub struct RunBatchUseCase<G: LlmGateway + 'static, R: KnowledgeRetriever + 'static> {
    generate: GenerateCasesUseCase<G, R>,
    history: Arc<dyn HistoryStore>,
    sink: Option<Arc<dyn ResultSink>>,
    cancellation_token: Option<CancellationToken>,
}

impl<G: LlmGateway + 'static, R: KnowledgeRetriever + 'static> RunBatchUseCase<G, R> {
    pub fn new(generate: GenerateCasesUseCase<G, R>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            generate,
            history,
            sink: None,
            cancellation_token: None,
        }
    }

    /// Write the result columns once the batch is done
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.generate = self.generate.with_cancellation(token.clone());
        self.cancellation_token = Some(token);
        self
    }

    pub async fn execute(&self, input: RunBatchInput) -> Result<BatchResult, BatchError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    pub async fn execute_with_progress(
        &self,
        input: RunBatchInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<BatchResult, BatchError> {
        let RunBatchInput {
            records,
            project_id,
            source,
        } = input;
        let total = records.len();
        let params = self.generate.params().clone();
        let token = self.cancellation_token.clone().unwrap_or_default();

        info!(
            "Batch started: {} requirements, {} at a time",
            total, params.max_concurrent_tasks
        );
        progress.on_batch_start(total);

        let (history_tx, history_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_history(Arc::clone(&self.history), history_rx));
        let metadata = HistoryMetadata {
            format: params.output_format.as_str().to_string(),
            source,
        };

        let semaphore = Arc::new(Semaphore::new(params.max_concurrent_tasks.max(1)));
        let mut join_set = JoinSet::new();
        for (index, record) in records.iter().cloned().enumerate() {
            let generate = self.generate.clone();
            let semaphore = Arc::clone(&semaphore);
            let token = token.clone();
            let history_tx = history_tx.clone();
            let metadata = metadata.clone();
            let task = record.task_context(params.output_format, &project_id);

            join_set.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return (index, TaskOutcome::Cancelled);
                };

                let label = record.id_or_index(index);
                match generate.execute(GenerateCasesInput::new(label.clone(), task)).await {
                    Ok(generated) => {
                        let entry = HistoryEntry::new(index, &record, &generated.output, metadata);
                        if history_tx.send(entry).is_err() {
                            warn!("[{}] history writer is gone, entry not persisted", label);
                        }
                        (index, TaskOutcome::Completed(generated.output))
                    }
                    Err(GenerateCasesError::Cancelled) => (index, TaskOutcome::Cancelled),
                    Err(e) => {
                        warn!("[{}] requirement {} failed: {}", label, index + 1, e);
                        (index, TaskOutcome::Failed(e.to_string()))
                    }
                }
            });
        }
        drop(history_tx);

        let mut rows: Vec<Option<TaskRow>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    let success = matches!(outcome, TaskOutcome::Completed(_));
                    if let Some(record) = records.get(index) {
                        progress.on_task_complete(index, &record.id_or_index(index), success);
                    }
                    if let Some(slot) = rows.get_mut(index) {
                        *slot = Some(outcome.into_row(index));
                    }
                }
                Err(e) => error!("Generation task aborted: {}", e),
            }
        }

        let history = match writer.await {
            Ok(entries) => entries,
            Err(e) => {
                error!("History writer failed: {}", e);
                Vec::new()
            }
        };

        let mut result = BatchResult::default();
        for (index, row) in rows.into_iter().enumerate() {
            result.push_row(row.unwrap_or_else(|| TaskRow::failed(index, "task aborted")));
        }
        result.history = history;

        if !result.is_aligned(total) {
            return Err(BatchError::Misaligned {
                expected: total,
                found: result.lengths(),
            });
        }

        if let Some(sink) = &self.sink {
            match sink.write(&result.columns(&records)) {
                Ok(path) => info!("Results written to {}", path.display()),
                Err(e) => error!("Failed to write results: {}", e),
            }
        }

        info!(
            "Batch finished: {} of {} requirements generated",
            result.history.len(),
            total
        );
        progress.on_batch_complete(&result);
        Ok(result)
    }
}

/// Sole owner of the history store during a batch. Appends each entry and
/// saves the whole history; a failed save is retried with the next entry.
/// Store I/O runs on the blocking pool. Returns the entries received.
async fn write_history(
    store: Arc<dyn HistoryStore>,
    mut entries: mpsc::UnboundedReceiver<HistoryEntry>,
) -> Vec<HistoryEntry> {
    let loader = Arc::clone(&store);
    let mut history = match tokio::task::spawn_blocking(move || loader.load()).await {
        Ok(Ok(history)) => history,
        Ok(Err(e)) => {
            warn!("Could not load generation history, starting a new one: {}", e);
            Vec::new()
        }
        Err(e) => {
            error!("History load task failed: {}", e);
            Vec::new()
        }
    };

    let mut written = Vec::new();
    while let Some(entry) = entries.recv().await {
        history.push(entry.clone());
        written.push(entry);

        let saver = Arc::clone(&store);
        let snapshot = history.clone();
        match tokio::task::spawn_blocking(move || saver.save(&snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to save generation history: {}", e),
            Err(e) => error!("History save task failed: {}", e),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationParams;
    use crate::ports::history_store::{HistoryError, InMemoryHistory};
    use crate::ports::knowledge_retriever::NoRetriever;
    use crate::ports::llm_gateway::GatewayError;
    use crate::ports::result_sink::SinkError;
    use crate::use_cases::test_support::{ScriptedGateway, pipeline_reply, task_text};
    use casegen_domain::batch::result::{CANCELLED, FAILED_COST};
    use casegen_domain::batch::columns;
    use casegen_domain::{AgentRegistry, ModelConfig};
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<BTreeMap<String, Vec<String>>>>,
    }

    impl ResultSink for RecordingSink {
        fn write(&self, columns: &BTreeMap<String, Vec<String>>) -> Result<PathBuf, SinkError> {
            self.written.lock().unwrap().push(columns.clone());
            Ok(PathBuf::from("results.json"))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Mutex<Option<usize>>,
        completed: Mutex<Vec<(usize, String, bool)>>,
        finished: Mutex<bool>,
    }

    impl ProgressNotifier for RecordingProgress {
        fn on_batch_start(&self, total_tasks: usize) {
            *self.started.lock().unwrap() = Some(total_tasks);
        }

        fn on_task_complete(&self, index: usize, requirement_id: &str, success: bool) {
            self.completed
                .lock()
                .unwrap()
                .push((index, requirement_id.to_string(), success));
        }

        fn on_batch_complete(&self, _result: &BatchResult) {
            *self.finished.lock().unwrap() = true;
        }
    }

    struct BrokenHistory;

    impl HistoryStore for BrokenHistory {
        fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
            Err(HistoryError::Serialization("expected value at line 1".to_string()))
        }

        fn save(&self, _entries: &[HistoryEntry]) -> Result<(), HistoryError> {
            Err(HistoryError::Io(std::io::Error::other("read-only")))
        }
    }

    fn batch(
        gateway: Arc<ScriptedGateway>,
        params: GenerationParams,
        history: Arc<dyn HistoryStore>,
    ) -> RunBatchUseCase<ScriptedGateway, NoRetriever> {
        let generate = GenerateCasesUseCase::new(
            gateway,
            Arc::new(NoRetriever),
            ModelConfig::default(),
            AgentRegistry::default(),
            params,
        );
        RunBatchUseCase::new(generate, history)
    }

    fn records(titles: &[&str]) -> Vec<RequirementRecord> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                RequirementRecord::new(*title, "As a customer")
                    .with_id(format!("PRJ-{}", i + 1))
                    .with_acceptance_criteria("It works")
            })
            .collect()
    }

    #[tokio::test]
    async fn test_failed_task_keeps_sequences_aligned() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, Some("BROKEN"))));
        let history = Arc::new(InMemoryHistory::new());
        let sink = Arc::new(RecordingSink::default());
        let progress = RecordingProgress::default();

        let result = batch(gateway, GenerationParams::default(), history.clone())
            .with_sink(sink.clone())
            .execute_with_progress(
                RunBatchInput::new(records(&["Login", "BROKEN transfer", "Logout"]), "PRJ"),
                &progress,
            )
            .await
            .unwrap();

        assert!(result.is_aligned(3));
        assert!(result.prompts[0].contains("Login"));
        assert_eq!(result.prompts[1], "Error processing requirement 2");
        assert_eq!(result.full_prompts[1], "Error processing requirement 2");
        assert!(result.artifacts[1].starts_with("Error: Test case generation failed"));
        assert_eq!(result.costs[1], FAILED_COST);
        assert!(result.prompts[2].contains("Logout"));
        assert_eq!(result.costs[2], "105 tokens");

        // history holds the two successes, in the store too
        assert_eq!(result.history.len(), 2);
        let stored: Vec<_> = history
            .entries()
            .into_iter()
            .map(|e| e.requirement_id)
            .collect();
        assert_eq!(stored, vec!["PRJ-1", "PRJ-3"]);
        assert_eq!(history.entries()[0].metadata.source, "requirements_file");
        assert_eq!(history.entries()[0].metadata.format, "gherkin-plain");

        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0][columns::IDS], vec!["PRJ-1", "PRJ-2", "PRJ-3"]);
        assert_eq!(written[0][columns::ARTIFACTS].len(), 3);

        assert_eq!(*progress.started.lock().unwrap(), Some(3));
        let mut completed = progress.completed.lock().unwrap().clone();
        completed.sort();
        assert_eq!(
            completed,
            vec![
                (0, "PRJ-1".to_string(), true),
                (1, "PRJ-2".to_string(), false),
                (2, "PRJ-3".to_string(), true),
            ]
        );
        assert!(*progress.finished.lock().unwrap());
    }

    #[tokio::test]
    async fn test_every_task_failing_stays_aligned() {
        let gateway = Arc::new(ScriptedGateway::new(|_| Err(GatewayError::Timeout)));
        let result = batch(
            gateway,
            GenerationParams::default(),
            Arc::new(InMemoryHistory::new()),
        )
        .execute(RunBatchInput::new(records(&["a", "b", "c"]), "PRJ"))
        .await
        .unwrap();

        assert!(result.is_aligned(3));
        assert!(result.history.is_empty());
        for (i, prompt) in result.prompts.iter().enumerate() {
            assert_eq!(*prompt, format!("Error processing requirement {}", i + 1));
        }
        assert_eq!(result.artifacts[0], "Error: Context assembly failed: Timeout");
    }

    #[tokio::test]
    async fn test_concurrent_results_keep_record_order() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let titles = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"];
        let result = batch(
            gateway,
            GenerationParams::default().with_max_concurrent_tasks(3),
            Arc::new(InMemoryHistory::new()),
        )
        .execute(RunBatchInput::new(records(&titles), "PRJ"))
        .await
        .unwrap();

        assert!(result.is_aligned(5));
        for (prompt, title) in result.prompts.iter().zip(titles) {
            assert!(prompt.contains(title), "{title} missing from {prompt}");
        }
        let mut ids: Vec<_> = result
            .history
            .iter()
            .map(|e| e.requirement_id.clone())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["PRJ-1", "PRJ-2", "PRJ-3", "PRJ-4", "PRJ-5"]);
    }

    #[tokio::test]
    async fn test_cancelled_batch_fills_placeholders() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let token = CancellationToken::new();
        token.cancel();

        let result = batch(
            gateway.clone(),
            GenerationParams::default(),
            Arc::new(InMemoryHistory::new()),
        )
        .with_cancellation(token)
        .execute(RunBatchInput::new(records(&["a", "b"]), "PRJ"))
        .await
        .unwrap();

        assert!(result.is_aligned(2));
        assert_eq!(result.prompts, vec![CANCELLED, CANCELLED]);
        assert_eq!(result.costs, vec![CANCELLED, CANCELLED]);
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_mid_batch_keeps_finished_rows() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let gateway = Arc::new(ScriptedGateway::new(move |req| {
            if task_text(req).contains("Interrupted") {
                trigger.cancel();
            }
            pipeline_reply(req, None)
        }));
        let history = Arc::new(InMemoryHistory::new());
        let sink = Arc::new(RecordingSink::default());

        let result = batch(gateway, GenerationParams::default(), history.clone())
            .with_sink(sink.clone())
            .with_cancellation(token)
            .execute(RunBatchInput::new(
                records(&["Login", "Interrupted transfer", "Logout"]),
                "PRJ",
            ))
            .await
            .unwrap();

        assert!(result.is_aligned(3));
        assert!(result.prompts[0].contains("Login"));
        assert_eq!(result.costs[0], "105 tokens");
        assert_eq!(result.prompts[1], CANCELLED);
        assert_eq!(result.artifacts[1], CANCELLED);
        assert_eq!(result.prompts[2], CANCELLED);

        assert_eq!(result.history.len(), 1);
        assert_eq!(history.entries()[0].requirement_id, "PRJ-1");
        // the partial result is still written out
        assert_eq!(sink.written.lock().unwrap()[0][columns::IDS].len(), 3);
    }

    #[tokio::test]
    async fn test_existing_history_is_extended() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let history = Arc::new(InMemoryHistory::new());
        let earlier = HistoryEntry::new(
            0,
            &RequirementRecord::new("Earlier", ""),
            &TaskOutput {
                prompt: "p".to_string(),
                full_prompt: "f".to_string(),
                artifact: "[]".to_string(),
                costs: Default::default(),
            },
            HistoryMetadata {
                format: "gherkin-plain".to_string(),
                source: "requirements_file".to_string(),
            },
        );
        history.save(&[earlier]).unwrap();

        let result = batch(gateway, GenerationParams::default(), history.clone())
            .execute(RunBatchInput::new(records(&["Login"]), "PRJ").with_source("tracker"))
            .await
            .unwrap();

        assert_eq!(result.history.len(), 1);
        let stored = history.entries();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].requirement_title, "Earlier");
        assert_eq!(stored[1].metadata.source, "tracker");
    }

    #[tokio::test]
    async fn test_history_failures_do_not_fail_the_batch() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let result = batch(gateway, GenerationParams::default(), Arc::new(BrokenHistory))
            .execute(RunBatchInput::new(records(&["Login", "Logout"]), "PRJ"))
            .await
            .unwrap();

        assert!(result.is_aligned(2));
        assert_eq!(result.history.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let gateway = Arc::new(ScriptedGateway::new(|req| pipeline_reply(req, None)));
        let result = batch(
            gateway,
            GenerationParams::default(),
            Arc::new(InMemoryHistory::new()),
        )
        .execute(RunBatchInput::new(Vec::new(), "PRJ"))
        .await
        .unwrap();
        assert!(result.is_empty());
        assert!(result.is_aligned(0));
    }
}
