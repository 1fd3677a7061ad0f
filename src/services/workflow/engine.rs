//! Workflow Engine
//!
//! Drives a generation request through the stage machine:
//!
//! `Received → Analyzed → StrategySelected → Drafted → Assessed →
//! {Enhancing → Assessed}* → Finalized | Failed`
//!
//! The engine is the only owner of a run while it executes. Runs share
//! nothing mutable; the selector, catalog and configuration are read-only
//! after construction, so one engine can execute many runs concurrently.
//!
//! ## Enhancement loop
//!
//! At every `Assessed` decision point the loop stops, in order, when:
//! 1. the request has no quality target
//! 2. the overall score meets the target
//! 3. the last pass converged or regressed
//! 4. the pass budget is spent
//! 5. the run time budget is spent
//!
//! Finalization installs the best artifact seen so far, which is not
//! necessarily the latest.
//!
//! ## Failures
//!
//! Validation errors and fatal backend errors during drafting fail the run.
//! A fatal backend error during an enhancement pass ends enhancement and
//! finalizes the best artifact as degraded, unless the request demands
//! strict success. Cancellation fails the run, keeping its last artifact.

use std::sync::Arc;

use story_forge_core::{CoreError, GenerationRequest, WorkflowStage};
use story_forge_llm::{
    call_with_retry, BackendError, BackendResult, CancellationToken, DraftParams, TextBackend,
};
use story_forge_quality::{QualityAssessor, QualityProfile, UNASSESSABLE_SCORE};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::enhancement::EnhancementStrategy;
use crate::models::run::{
    EnhancementPass, RunError, RunErrorKind, RunOutcome, RunSummary, StopReason, WorkflowRun,
};
use crate::models::settings::EngineConfig;
use crate::models::strategy::StrategyPlan;
use crate::services::enhancement::{EnhancementApplier, EnhancementCatalog};
use crate::services::strategy::StrategySelector;
use crate::services::telemetry::{
    NoopTelemetry, RunHistory, StageOutcome, StrategyStatistics, TelemetryEvent, TelemetrySink,
};
use crate::services::workflow::convergence::{ConvergenceSignal, ConvergenceTracker};
use crate::services::workflow::events::WorkflowEvent;
use crate::utils::error::AppResult;

type EventSender<'a> = Option<&'a mpsc::Sender<WorkflowEvent>>;

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

fn internal(err: CoreError, stage: WorkflowStage) -> RunError {
    RunError::new(RunErrorKind::Internal, stage, err.to_string())
}

fn backend_failure(err: BackendError, stage: WorkflowStage) -> RunError {
    if err.is_cancelled() {
        RunError::new(RunErrorKind::Cancelled, stage, "run cancelled")
    } else {
        RunError::new(RunErrorKind::BackendFatal, stage, err.to_string())
    }
}

async fn emit(events: EventSender<'_>, event: WorkflowEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

/// Draft output: the story and the outline it expanded, if any.
struct Draft {
    outline: Option<String>,
    story: String,
}

/// Quality-driven story generation engine.
pub struct WorkflowEngine {
    config: Arc<EngineConfig>,
    selector: StrategySelector,
    catalog: Arc<EnhancementCatalog>,
    backend: Arc<dyn TextBackend>,
    assessor: Arc<dyn QualityAssessor>,
    applier: EnhancementApplier,
    telemetry: Arc<dyn TelemetrySink>,
    history: Arc<RunHistory>,
}

impl WorkflowEngine {
    /// Create an engine from validated configuration.
    pub fn new(
        config: Arc<EngineConfig>,
        backend: Arc<dyn TextBackend>,
        assessor: Arc<dyn QualityAssessor>,
    ) -> AppResult<Self> {
        config.validate()?;
        let catalog =
            EnhancementCatalog::from_config(&config.enhancement, config.dimension_targets.clone())?;
        let applier = EnhancementApplier::new(
            backend.clone(),
            config.retry.clone(),
            config.timeouts.enhancement(),
        );

        Ok(Self {
            selector: StrategySelector::new(config.selector.clone()),
            catalog: Arc::new(catalog),
            backend,
            assessor,
            applier,
            telemetry: Arc::new(NoopTelemetry),
            history: Arc::new(RunHistory::new(config.history_capacity)),
            config,
        })
    }

    /// Replace the default no-op telemetry sink.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    pub fn catalog(&self) -> &EnhancementCatalog {
        &self.catalog
    }

    pub fn history(&self) -> Arc<RunHistory> {
        self.history.clone()
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Execute a request to a terminal run.
    pub async fn execute_workflow(&self, request: GenerationRequest) -> WorkflowRun {
        self.drive(request, CancellationToken::new(), None).await
    }

    /// Execute a request, stopping cooperatively when `cancel` fires.
    pub async fn execute_workflow_with_cancel(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
    ) -> WorkflowRun {
        self.drive(request, cancel, None).await
    }

    /// Execute a request, sending progress events as the run advances. A
    /// dropped receiver does not affect the run.
    pub async fn execute_workflow_streaming(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
        events: mpsc::Sender<WorkflowEvent>,
    ) -> WorkflowRun {
        self.drive(request, cancel, Some(&events)).await
    }

    /// Summaries of the most recent completed runs, newest first.
    pub async fn recent_runs(&self, n: usize) -> Vec<RunSummary> {
        self.history.recent(n).await
    }

    /// Per-strategy statistics over the retained history.
    pub async fn strategy_statistics(&self) -> Vec<StrategyStatistics> {
        self.history.strategy_statistics().await
    }

    // ========================================================================
    // Run lifecycle
    // ========================================================================

    async fn drive(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
        events: EventSender<'_>,
    ) -> WorkflowRun {
        let started = Instant::now();
        let mut run = WorkflowRun::new(request);
        info!(
            run_id = %run.id(),
            genre = %run.request().genre,
            target_words = run.request().target_word_count,
            quality_target = ?run.request().quality_target,
            "Workflow started"
        );

        if let Err(run_error) = self.run_stages(&mut run, &cancel, events, started).await {
            match run_error.kind {
                RunErrorKind::Validation | RunErrorKind::Cancelled => {
                    warn!(run_id = %run.id(), error = %run_error, "Workflow failed")
                }
                RunErrorKind::BackendFatal | RunErrorKind::Internal => {
                    error!(run_id = %run.id(), error = %run_error, "Workflow failed")
                }
            }
            if let Err(e) = run.fail(run_error, elapsed_ms(started)) {
                error!(run_id = %run.id(), error = %e, "Could not mark run as failed");
            }
            emit(
                events,
                WorkflowEvent::StageEntered {
                    run_id: run.id(),
                    stage: run.stage(),
                },
            )
            .await;
        }

        self.complete(&run, events).await;
        run
    }

    async fn complete(&self, run: &WorkflowRun, events: EventSender<'_>) {
        info!(
            run_id = %run.id(),
            outcome = ?run.outcome(),
            stop_reason = ?run.stop_reason(),
            passes = run.pass_count(),
            final_score = ?run.final_score(),
            duration_ms = run.duration_ms(),
            "Workflow finished"
        );

        self.telemetry.record(TelemetryEvent::RunCompleted {
            run_id: run.id(),
            outcome: run.outcome().unwrap_or(RunOutcome::Failed),
            strategy: run.strategy(),
            pass_count: run.pass_count(),
            final_score: run.final_score(),
            duration_ms: run.duration_ms(),
        });
        self.history.record(run.summary()).await;
        emit(
            events,
            WorkflowEvent::Finished {
                run: Box::new(run.clone()),
            },
        )
        .await;
    }

    fn stage_done(&self, run_id: Uuid, stage: WorkflowStage, since: Instant, outcome: StageOutcome) {
        self.telemetry.record(TelemetryEvent::Stage {
            run_id,
            stage,
            duration_ms: elapsed_ms(since),
            outcome,
        });
    }

    async fn enter(
        &self,
        run: &mut WorkflowRun,
        stage: WorkflowStage,
        events: EventSender<'_>,
    ) -> Result<(), RunError> {
        let from = run.stage();
        run.advance(stage).map_err(|e| internal(e, from))?;
        debug!(run_id = %run.id(), from = %from, to = %stage, "Stage transition");
        emit(
            events,
            WorkflowEvent::StageEntered {
                run_id: run.id(),
                stage,
            },
        )
        .await;
        Ok(())
    }

    // ========================================================================
    // Stages
    // ========================================================================

    async fn run_stages(
        &self,
        run: &mut WorkflowRun,
        cancel: &CancellationToken,
        events: EventSender<'_>,
        started: Instant,
    ) -> Result<(), RunError> {
        let run_id = run.id();

        // Received → Analyzed
        let stage_start = Instant::now();
        if let Err(e) = run.request().validate() {
            self.stage_done(run_id, WorkflowStage::Received, stage_start, StageOutcome::Failed);
            return Err(RunError::new(
                RunErrorKind::Validation,
                WorkflowStage::Received,
                e.to_string(),
            ));
        }
        self.enter(run, WorkflowStage::Analyzed, events).await?;
        self.stage_done(run_id, WorkflowStage::Analyzed, stage_start, StageOutcome::Completed);

        // Analyzed → StrategySelected
        let stage_start = Instant::now();
        let plan = self.selector.select(run.request());
        info!(
            run_id = %run_id,
            strategy = %plan.strategy,
            use_outline = plan.use_outline,
            pass_budget = plan.pass_budget,
            complexity = plan.analysis.complexity,
            "Strategy selected"
        );
        run.set_plan(plan.clone())
            .map_err(|e| internal(e, WorkflowStage::Analyzed))?;
        self.enter(run, WorkflowStage::StrategySelected, events).await?;
        emit(
            events,
            WorkflowEvent::StrategySelected {
                run_id,
                plan: plan.clone(),
            },
        )
        .await;
        self.stage_done(
            run_id,
            WorkflowStage::StrategySelected,
            stage_start,
            StageOutcome::Completed,
        );

        // StrategySelected → Drafted
        let stage_start = Instant::now();
        let draft = match self.generate_draft(run.request(), &plan, cancel).await {
            Ok(draft) => draft,
            Err(err) => {
                self.stage_done(run_id, WorkflowStage::Drafted, stage_start, StageOutcome::Failed);
                return Err(backend_failure(err, WorkflowStage::StrategySelected));
            }
        };
        let outlined = draft.outline.is_some();
        let word_count = draft.story.split_whitespace().count();
        if let Some(outline) = draft.outline {
            run.set_outline(outline)
                .map_err(|e| internal(e, WorkflowStage::StrategySelected))?;
        }
        run.set_artifact(draft.story)
            .map_err(|e| internal(e, WorkflowStage::StrategySelected))?;
        self.enter(run, WorkflowStage::Drafted, events).await?;
        emit(
            events,
            WorkflowEvent::DraftReady {
                run_id,
                word_count,
                outlined,
            },
        )
        .await;
        self.stage_done(run_id, WorkflowStage::Drafted, stage_start, StageOutcome::Completed);

        // Drafted → Assessed
        let stage_start = Instant::now();
        let artifact = run.artifact().unwrap_or_default().to_string();
        let profile = self
            .assess(&artifact, run.request(), cancel, WorkflowStage::Drafted)
            .await?;
        let overall = profile.overall();
        self.enter(run, WorkflowStage::Assessed, events).await?;
        run.record_initial_profile(profile)
            .map_err(|e| internal(e, WorkflowStage::Assessed))?;
        info!(run_id = %run_id, overall, "Draft assessed");
        emit(
            events,
            WorkflowEvent::Assessed {
                run_id,
                pass_number: 0,
                overall,
            },
        )
        .await;
        self.stage_done(run_id, WorkflowStage::Assessed, stage_start, StageOutcome::Completed);

        // Assessed → {Enhancing → Assessed}*
        let (stop_reason, pass_error) = self
            .enhance(run, &plan, cancel, events, started)
            .await?;

        // Assessed → Finalized
        let stage_start = Instant::now();
        let target = run.request().quality_target;
        let best = run
            .best()
            .map(|b| b.profile.overall())
            .unwrap_or(UNASSESSABLE_SCORE);
        let outcome = match target {
            Some(target) if best < target => RunOutcome::Degraded,
            _ => RunOutcome::Success,
        };
        run.finalize(outcome, stop_reason, pass_error, elapsed_ms(started))
            .map_err(|e| internal(e, WorkflowStage::Assessed))?;
        emit(
            events,
            WorkflowEvent::StageEntered {
                run_id,
                stage: WorkflowStage::Finalized,
            },
        )
        .await;
        self.stage_done(run_id, WorkflowStage::Finalized, stage_start, StageOutcome::Completed);
        Ok(())
    }

    /// Bounded enhancement loop. Returns why it stopped and, when a pass
    /// failed, the error to record on the finalized run.
    async fn enhance(
        &self,
        run: &mut WorkflowRun,
        plan: &StrategyPlan,
        cancel: &CancellationToken,
        events: EventSender<'_>,
        started: Instant,
    ) -> Result<(StopReason, Option<RunError>), RunError> {
        let run_id = run.id();
        let Some(target) = run.request().quality_target else {
            return Ok((StopReason::NoTarget, None));
        };
        let run_budget = self.config.timeouts.run_budget();
        let mut tracker = ConvergenceTracker::new(
            self.config.enhancement.convergence_threshold,
            self.config.enhancement.convergence_window,
        );
        let mut signal = ConvergenceSignal::Continue;

        loop {
            let current = run
                .profile()
                .cloned()
                .ok_or_else(|| internal(CoreError::internal("assessed run has no profile"), run.stage()))?;

            if current.overall() >= target {
                return Ok((StopReason::TargetMet, None));
            }
            match signal {
                ConvergenceSignal::Converged => return Ok((StopReason::Converged, None)),
                ConvergenceSignal::Regressed => return Ok((StopReason::Regressed, None)),
                ConvergenceSignal::Continue => {}
            }
            if run.pass_count() >= plan.pass_budget {
                return Ok((StopReason::BudgetExhausted, None));
            }
            if started.elapsed() > run_budget {
                return Ok((StopReason::TimeBudgetExhausted, None));
            }
            if cancel.is_cancelled() {
                return Err(RunError::new(
                    RunErrorKind::Cancelled,
                    WorkflowStage::Assessed,
                    "run cancelled",
                ));
            }

            let stage_start = Instant::now();
            let pass_number = run.pass_count() + 1;
            self.enter(run, WorkflowStage::Enhancing, events).await?;
            let strategy = self.catalog.select_best(&current);
            debug!(
                run_id = %run_id,
                pass_number,
                strategy = %strategy.kind,
                overall = current.overall(),
                "Applying enhancement"
            );

            let artifact = run.artifact().unwrap_or_default().to_string();
            let result = self
                .applier
                .apply(&strategy, &artifact, &current, run.request(), cancel)
                .await;
            let applied = match result {
                Ok(applied) => applied,
                Err(err) => {
                    self.stage_done(run_id, WorkflowStage::Enhancing, stage_start, StageOutcome::Failed);
                    let pass_error = backend_failure(err, WorkflowStage::Enhancing);
                    if pass_error.kind == RunErrorKind::Cancelled || run.request().strict_success {
                        return Err(pass_error);
                    }
                    warn!(
                        run_id = %run_id,
                        pass_number,
                        error = %pass_error.message,
                        "Enhancement pass failed, finalizing best artifact"
                    );
                    // The previous assessment still describes the current artifact.
                    self.enter(run, WorkflowStage::Assessed, events).await?;
                    return Ok((StopReason::EnhancementFailed, Some(pass_error)));
                }
            };

            let after = self
                .assess(&applied.artifact, run.request(), cancel, WorkflowStage::Enhancing)
                .await?;
            let pass = self.build_pass(pass_number, &strategy, current, after, applied.changes, stage_start);
            signal = tracker.observe(pass.before.overall(), pass.after.overall());

            self.enter(run, WorkflowStage::Assessed, events).await?;
            run.record_pass(pass.clone(), applied.artifact)
                .map_err(|e| internal(e, WorkflowStage::Assessed))?;
            info!(
                run_id = %run_id,
                pass_number,
                strategy = %pass.strategy,
                before = pass.before.overall(),
                after = pass.after.overall(),
                delta = pass.delta(),
                "Enhancement pass completed"
            );

            let overall = pass.after.overall();
            emit(events, WorkflowEvent::PassCompleted { run_id, pass }).await;
            emit(
                events,
                WorkflowEvent::Assessed {
                    run_id,
                    pass_number,
                    overall,
                },
            )
            .await;
            self.stage_done(run_id, WorkflowStage::Enhancing, stage_start, StageOutcome::Completed);
        }
    }

    fn build_pass(
        &self,
        pass_number: u32,
        strategy: &EnhancementStrategy,
        before: QualityProfile,
        after: QualityProfile,
        changes: Vec<String>,
        since: Instant,
    ) -> EnhancementPass {
        EnhancementPass {
            pass_number,
            strategy: strategy.kind,
            before,
            after,
            changes,
            duration_ms: elapsed_ms(since),
        }
    }

    // ========================================================================
    // Collaborator calls
    // ========================================================================

    async fn generate_draft(
        &self,
        request: &GenerationRequest,
        plan: &StrategyPlan,
        cancel: &CancellationToken,
    ) -> BackendResult<Draft> {
        let outline = if plan.use_outline {
            Some(
                self.draft_call("outline", DraftParams::outline(request), cancel)
                    .await?,
            )
        } else {
            None
        };
        let story = self
            .draft_call("draft", DraftParams::story(request, outline.clone()), cancel)
            .await?;
        Ok(Draft { outline, story })
    }

    async fn draft_call(
        &self,
        operation: &str,
        params: DraftParams,
        cancel: &CancellationToken,
    ) -> BackendResult<String> {
        let backend = self.backend.clone();
        call_with_retry(
            &self.config.retry,
            self.config.timeouts.draft(),
            operation,
            cancel,
            |ctx| {
                let backend = backend.clone();
                let params = params.clone();
                async move { backend.generate_draft(&params, &ctx).await }
            },
        )
        .await
    }

    /// Score an artifact, abandoning the assessment if the run is cancelled.
    async fn assess(
        &self,
        artifact: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        stage: WorkflowStage,
    ) -> Result<QualityProfile, RunError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RunError::new(
                RunErrorKind::Cancelled,
                stage,
                "run cancelled during assessment",
            )),
            profile = self.assessor.assess(artifact, request) => Ok(profile),
        }
    }
}
