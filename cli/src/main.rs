//! CLI entrypoint for casegen
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use casegen_application::{
    GenerateCasesUseCase, LoggingTurnObserver, ProgressNotifier, ResultSink, RunBatchInput,
    RunBatchUseCase, TurnObserver,
};
use casegen_domain::AgentRegistry;
use casegen_infrastructure::{
    ConfigLoader, FileConfig, FileTranscriptExporter, GraphCliRetriever, JsonColumnSink,
    JsonHistoryStore, JsonlConversationLogger, OpenAiConfig, OpenAiGateway, load_requirements,
};
use casegen_presentation::{Cli, ConsoleFormatter, ProgressReporter, SimpleProgress};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Console logs by verbosity; optional daily-rolling file next to them.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "casegen.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

/// Command-line flags override the merged file configuration.
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(project) = &cli.project {
        config.retrieval.project_id = Some(project.clone());
    }
    if let Some(format) = &cli.format {
        config.generation.output_format = format.clone();
    }
    if let Some(rounds) = cli.rounds {
        config.generation.critique_rounds = rounds;
    }
    if let Some(turns) = cli.context_turns {
        config.generation.context_max_turns = turns;
    }
    if let Some(jobs) = cli.jobs {
        config.generation.max_concurrent_tasks = jobs;
    }
    if cli.accessibility {
        config.generation.with_accessibility_expert = true;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.dir = Some(dir.clone());
    }
}

/// Cancel the batch on Ctrl+C; a second Ctrl+C kills the process.
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("Interrupted: finishing in-flight turns, no new requirements will start");
        token.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration before logging so [logging].dir can take effect
    let config_result = if cli.no_config {
        Ok(ConfigLoader::load_defaults())
    } else {
        ConfigLoader::load(cli.config.as_deref())
    };
    let mut config = config_result.context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli);

    let _log_guard = init_logging(cli.verbose, config.logging.dir.as_deref());
    if !config.output.color {
        colored::control::set_override(false);
    }

    if cli.show_config {
        println!(
            "{}",
            ConsoleFormatter::format_config_sources(&ConfigLoader::describe_sources(
                cli.config.as_deref()
            ))
        );
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let issues = config.validate();
    if !issues.is_empty() {
        eprint!("{}", ConsoleFormatter::format_config_issues(&issues));
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("Invalid configuration");
    }

    let Some(requirements_path) = cli.requirements.as_deref() else {
        bail!("A requirements file is required");
    };
    let Some(project_id) = config.retrieval.project_id.clone() else {
        bail!("No project id: pass --project or set retrieval.project_id");
    };

    let records = load_requirements(requirements_path)?;
    info!(
        "Loaded {} requirements from {}",
        records.len(),
        requirements_path.display()
    );
    if records.is_empty() {
        warn!("Requirements file is empty, nothing to generate");
    }

    // === Dependency Injection ===
    let gateway = Arc::new(OpenAiGateway::new(OpenAiConfig::from_file(
        &config.providers.openai,
    )?)?);
    let retriever = Arc::new(GraphCliRetriever::from_config(&config.retrieval));
    let registry = AgentRegistry::new(config.retrieval.sources.clone());
    let params = config.generation.to_params();
    let models = config.models.to_model_config();

    let token = CancellationToken::new();
    spawn_interrupt_handler(token.clone());

    let progress: Arc<dyn ProgressNotifier>;
    let turn_observer: Arc<dyn TurnObserver>;
    if cli.quiet {
        let simple = Arc::new(SimpleProgress);
        progress = simple.clone();
        turn_observer = simple;
    } else {
        let reporter = Arc::new(ProgressReporter::new());
        progress = reporter.clone();
        turn_observer = reporter;
    }

    let mut generate = GenerateCasesUseCase::new(gateway, retriever, models, registry, params)
        .with_exporter(Arc::new(FileTranscriptExporter::new(
            config.output.transcripts_dir(),
        )))
        .with_observer(turn_observer)
        .with_cancellation(token.clone());

    if config.logging.conversations {
        let run_id = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        if let Some(logger) =
            JsonlConversationLogger::open(config.output.conversation_log_path(), run_id)
        {
            info!("Conversation log: {}", logger.path().display());
            generate = generate.with_observer(Arc::new(LoggingTurnObserver::new(Arc::new(logger))));
        }
    }

    let sink = Arc::new(JsonColumnSink::new(config.output.results_path()));
    let use_case = RunBatchUseCase::new(
        generate,
        Arc::new(JsonHistoryStore::new(config.output.history_path())),
    )
    .with_sink(sink.clone() as Arc<dyn ResultSink>)
    .with_cancellation(token);

    let input = RunBatchInput::new(records.clone(), project_id);
    let result = use_case
        .execute_with_progress(input, progress.as_ref())
        .await?;

    println!(
        "{}",
        ConsoleFormatter::format_summary(&result, &records, Some(sink.path()))
    );

    Ok(())
}
