//! Story Forge - command line entry point
//!
//! Generates one story against an OpenAI-compatible backend, logging
//! progress as the workflow advances and printing the finished run as JSON.
//! Ctrl-C cancels the run cooperatively.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use story_forge::services::{BackendDimensionAssessor, TelemetryRecorder};
use story_forge::{EngineConfig, RunOutcome, WorkflowEngine, WorkflowEvent};
use story_forge_core::{Genre, GenerationRequestBuilder, LengthClass};
use story_forge_llm::{
    BackendConfig, CancellationToken, CompletionBackend, OpenAiCompatibleBackend, PromptedBackend,
};
use story_forge_quality::AssessmentPipeline;

/// Command-line arguments for story-forge
#[derive(Parser, Debug)]
#[command(name = "story-forge")]
#[command(about = "Quality-driven short story generation")]
#[command(version)]
struct Args {
    /// Genre (mystery, sci-fi, fantasy, romance, literary, or any label)
    #[arg(short, long)]
    genre: String,

    /// Target word count
    #[arg(short, long, default_value = "1500")]
    words: u32,

    /// Length class (flash or short); derived from the word count if omitted
    #[arg(long)]
    length: Option<String>,

    #[arg(long)]
    theme: Option<String>,

    #[arg(long)]
    setting: Option<String>,

    /// Overall score to reach (0-10); omit to skip enhancement
    #[arg(short, long)]
    quality_target: Option<f64>,

    /// Maximum enhancement passes (0-10)
    #[arg(long, default_value = "3")]
    max_passes: u32,

    /// Fail instead of returning a degraded draft when enhancement breaks
    #[arg(long)]
    strict: bool,

    /// Engine configuration file (TOML)
    #[arg(short, long, env = "STORY_FORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Model name
    #[arg(long, default_value = "gpt-4o-mini", env = "STORY_FORGE_MODEL")]
    model: String,

    /// Chat completions endpoint of an OpenAI-compatible server
    #[arg(long, env = "STORY_FORGE_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "STORY_FORGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let config = Arc::new(config);

    // Backend
    let mut backend_config = BackendConfig::new(args.model.clone());
    backend_config.base_url = args.base_url.clone();
    backend_config.api_key = args.api_key.clone();
    let completion: Arc<dyn CompletionBackend> = Arc::new(
        OpenAiCompatibleBackend::new(backend_config).context("Failed to create backend")?,
    );
    let backend = Arc::new(PromptedBackend::new(completion.clone()));

    // Assessment
    let dimension_assessor = Arc::new(
        BackendDimensionAssessor::new(completion, config.timeouts.assessment())
            .context("Failed to create assessor")?,
    );
    let assessor = Arc::new(
        AssessmentPipeline::new(dimension_assessor, Arc::new(config.weights.clone()))
            .with_config(config.assessment_config()),
    );

    let telemetry = Arc::new(TelemetryRecorder::new(config.telemetry_buffer));
    let engine = WorkflowEngine::new(config.clone(), backend, assessor)
        .context("Failed to initialize workflow engine")?
        .with_telemetry(telemetry.clone());

    // Request
    let mut builder = GenerationRequestBuilder::new(Genre::parse(&args.genre), args.words)
        .max_enhancement_passes(args.max_passes)
        .strict_success(args.strict);
    if let Some(length) = &args.length {
        builder = builder.length(LengthClass::parse(length)?);
    }
    if let Some(theme) = &args.theme {
        builder = builder.theme(theme);
    }
    if let Some(setting) = &args.setting {
        builder = builder.setting(setting);
    }
    if let Some(target) = args.quality_target {
        builder = builder.quality_target(target);
    }
    let request = builder.build_unchecked();

    // Cancellation
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            interrupt.cancel();
        }
    });

    // Progress
    let (event_tx, mut event_rx) = mpsc::channel::<WorkflowEvent>(64);
    let progress = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            log_event(&event);
        }
    });

    let run = engine
        .execute_workflow_streaming(request, cancel, event_tx)
        .await;
    let _ = progress.await;

    if let Some(snapshot) = telemetry.snapshot().await {
        debug!(snapshot = ?snapshot, "Telemetry");
    }
    telemetry.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&run)?);

    if run.outcome() == Some(RunOutcome::Failed) {
        let reason = run
            .error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        anyhow::bail!("Run failed: {}", reason);
    }
    Ok(())
}

fn log_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::StageEntered { stage, .. } => info!(stage = %stage, "Stage"),
        WorkflowEvent::StrategySelected { plan, .. } => info!(
            strategy = %plan.strategy,
            pass_budget = plan.pass_budget,
            "{}",
            plan.reasoning
        ),
        WorkflowEvent::DraftReady {
            word_count,
            outlined,
            ..
        } => info!(word_count, outlined, "Draft ready"),
        WorkflowEvent::Assessed {
            pass_number,
            overall,
            ..
        } => info!(pass_number, overall, "Assessed"),
        WorkflowEvent::PassCompleted { pass, .. } => info!(
            pass_number = pass.pass_number,
            strategy = %pass.strategy,
            delta = pass.delta(),
            changes = ?pass.changes,
            "Enhancement pass"
        ),
        WorkflowEvent::Finished { run } => info!(
            outcome = ?run.outcome(),
            stop_reason = ?run.stop_reason(),
            final_score = ?run.final_score(),
            "Finished"
        ),
    }
}
