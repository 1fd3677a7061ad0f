//! Workflow Engine Integration Tests
//!
//! Drives complete runs through the stage machine with scripted backends:
//! target met, convergence, regression, budget limits, failure handling,
//! cancellation, streaming events, telemetry and run history.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use story_forge::services::TelemetryRecorder;
use story_forge::{
    EngineConfig, EnhancementStrategyKind, GenerationStrategy, RunErrorKind, RunOutcome,
    StopReason, WorkflowEvent,
};
use story_forge_core::{
    GenerationRequest, GenerationRequestBuilder, Genre, QualityDimension, WorkflowStage,
};
use story_forge_llm::{CancellationToken, RetryPolicy};
use story_forge_quality::{
    AssessmentConfig, AssessmentError, AssessmentPipeline, DimensionAssessor, QualityAssessor,
    QualityProfile, WeightTable,
};
use tokio::sync::mpsc;

use crate::support::{
    engine, engine_with, fatal, test_config, transient, ScriptedAssessor, ScriptedBackend,
    DRAFT_TEXT, OUTLINE_TEXT,
};

fn mystery_request() -> GenerationRequest {
    GenerationRequestBuilder::new(Genre::Mystery, 2000)
        .quality_target(8.0)
        .max_enhancement_passes(3)
        .build()
        .unwrap()
}

fn untargeted_request() -> GenerationRequest {
    GenerationRequestBuilder::new(Genre::Romance, 800)
        .build()
        .unwrap()
}

// ============================================================================
// Enhancement Loop Termination
// ============================================================================

#[tokio::test]
async fn test_target_met_after_two_passes() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.8, 8.1]));
    let engine = engine(backend.clone(), assessor.clone());

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.stage(), WorkflowStage::Finalized);
    assert_eq!(run.outcome(), Some(RunOutcome::Success));
    assert_eq!(run.stop_reason(), Some(StopReason::TargetMet));
    assert_eq!(run.pass_count(), 2);
    assert_eq!(run.final_score(), Some(8.1));
    assert_eq!(run.initial_profile().map(|p| p.overall()), Some(6.5));
    assert!(run.error().is_none());
    assert!(run.feedback().is_some());

    // Long mystery with a target: full budget, outline first
    let plan = run.plan().unwrap();
    assert_eq!(plan.strategy, GenerationStrategy::Iterative);
    assert!(plan.use_outline);
    assert_eq!(plan.pass_budget, 3);
    assert_eq!(backend.outline_calls(), 1);
    assert_eq!(backend.draft_calls(), 2);
    assert_eq!(run.outline(), Some(OUTLINE_TEXT));

    assert!(run.artifact().unwrap().contains("Revision 2."));
    assert_eq!(assessor.assessed().len(), 3);
    assert_eq!(backend.revise_calls(), 2);
}

#[tokio::test]
async fn test_passes_target_the_weakest_weighted_deficit() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.8, 8.1]));
    let engine = engine(backend.clone(), assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    let passes = run.passes();
    assert_eq!(passes.len(), 2);
    // Uniform 3.5 deficit: the heaviest single-dimension entry wins
    assert_eq!(passes[0].strategy, EnhancementStrategyKind::Emotional);
    assert_eq!(passes[0].pass_number, 1);
    assert_eq!(passes[0].delta(), 1.3);
    // 2.2 deficit is below materiality
    assert_eq!(passes[1].strategy, EnhancementStrategyKind::Comprehensive);
    assert_eq!(passes[1].delta(), 0.3);
    assert!(!passes[0].changes.is_empty());

    let hints = backend.hints();
    assert_eq!(hints[0].strategy_id, "emotional_enhancement");
    assert_eq!(
        hints[0].target_dimensions,
        vec![QualityDimension::EmotionalImpact]
    );
    assert_eq!(hints[1].strategy_id, "comprehensive");

    let summary = run.summary();
    assert_eq!(
        summary.most_effective_strategy,
        Some(EnhancementStrategyKind::Emotional)
    );
    assert_eq!(summary.initial_score, Some(6.5));
    assert_eq!(summary.final_score, Some(8.1));
}

#[tokio::test]
async fn test_small_gains_converge_below_target() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 6.6, 6.65]));
    let engine = engine(backend.clone(), assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.outcome(), Some(RunOutcome::Degraded));
    assert_eq!(run.stop_reason(), Some(StopReason::Converged));
    assert_eq!(run.pass_count(), 2);
    assert_eq!(run.final_score(), Some(6.65));
    assert!(run.error().is_none());
    assert_eq!(backend.revise_calls(), 2);
}

#[tokio::test]
async fn test_tiny_deltas_converge() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 6.55, 6.58]));
    let engine = engine(backend, assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.stop_reason(), Some(StopReason::Converged));
    assert_eq!(run.pass_count(), 2);
    let deltas: Vec<f64> = run.passes().iter().map(|p| p.delta()).collect();
    assert_eq!(deltas, vec![0.05, 0.03]);
}

#[tokio::test]
async fn test_regression_keeps_best_artifact() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.2, 6.9]));
    let engine = engine(backend, assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.stop_reason(), Some(StopReason::Regressed));
    assert_eq!(run.outcome(), Some(RunOutcome::Degraded));
    assert_eq!(run.pass_count(), 2);
    assert_eq!(run.final_score(), Some(7.2));
    assert_eq!(run.best().map(|b| b.pass_number), Some(1));

    let artifact = run.artifact().unwrap();
    assert!(artifact.contains("Revision 1."));
    assert!(!artifact.contains("Revision 2."));
}

#[tokio::test]
async fn test_pass_budget_exhausted() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.0, 6.5, 7.0, 7.5]));
    let engine = engine(backend.clone(), assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.stop_reason(), Some(StopReason::BudgetExhausted));
    assert_eq!(run.outcome(), Some(RunOutcome::Degraded));
    assert_eq!(run.pass_count(), 3);
    assert_eq!(run.final_score(), Some(7.5));
    assert_eq!(backend.revise_calls(), 3);
}

#[tokio::test]
async fn test_outline_first_budget_is_capped() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[5.0, 5.5, 6.0, 6.5]));
    let engine = engine(backend, assessor);

    let request = GenerationRequestBuilder::new(Genre::Romance, 800)
        .quality_target(9.0)
        .max_enhancement_passes(5)
        .build()
        .unwrap();
    let run = engine.execute_workflow(request).await;

    let plan = run.plan().unwrap();
    assert_eq!(plan.strategy, GenerationStrategy::OutlineFirst);
    assert_eq!(plan.pass_budget, 2);
    assert_eq!(run.stop_reason(), Some(StopReason::BudgetExhausted));
    assert_eq!(run.pass_count(), 2);
}

#[tokio::test]
async fn test_no_target_returns_draft() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[5.5]));
    let engine = engine(backend.clone(), assessor.clone());

    let run = engine.execute_workflow(untargeted_request()).await;

    assert_eq!(run.outcome(), Some(RunOutcome::Success));
    assert_eq!(run.stop_reason(), Some(StopReason::NoTarget));
    assert_eq!(run.pass_count(), 0);
    assert_eq!(run.final_score(), Some(5.5));
    assert_eq!(run.artifact(), Some(DRAFT_TEXT));
    assert_eq!(run.strategy(), Some(GenerationStrategy::Direct));
    assert!(run.outline().is_none());
    assert_eq!(backend.draft_calls(), 1);
    assert_eq!(backend.revise_calls(), 0);
    assert_eq!(assessor.assessed(), vec![DRAFT_TEXT.to_string()]);
}

#[tokio::test]
async fn test_draft_already_meets_target() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[8.5]));
    let engine = engine(backend.clone(), assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.outcome(), Some(RunOutcome::Success));
    assert_eq!(run.stop_reason(), Some(StopReason::TargetMet));
    assert_eq!(run.pass_count(), 0);
    assert_eq!(backend.revise_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_time_budget_stops_enhancement() {
    struct SlowAssessor(ScriptedAssessor);

    #[async_trait]
    impl QualityAssessor for SlowAssessor {
        async fn assess(&self, artifact: &str, request: &GenerationRequest) -> QualityProfile {
            tokio::time::sleep(Duration::from_secs(40)).await;
            self.0.assess(artifact, request).await
        }
    }

    let mut config = test_config();
    config.timeouts.run_seconds = 60;
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(SlowAssessor(ScriptedAssessor::new(&[5.0, 6.0, 7.0])));
    let engine = engine_with(config, backend, assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    // 40s draft assessment, then 40s for pass 1 puts the run over 60s
    assert_eq!(run.stop_reason(), Some(StopReason::TimeBudgetExhausted));
    assert_eq!(run.pass_count(), 1);
    assert_eq!(run.final_score(), Some(6.0));
}

// ============================================================================
// Failure Handling
// ============================================================================

#[tokio::test]
async fn test_fatal_draft_error_fails_run() {
    let backend = Arc::new(ScriptedBackend::new().push_draft(Err(fatal())));
    let assessor = Arc::new(ScriptedAssessor::new(&[7.0]));
    let engine = engine(backend.clone(), assessor.clone());

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.stage(), WorkflowStage::Failed);
    assert_eq!(run.outcome(), Some(RunOutcome::Failed));
    assert!(run.artifact().is_none());
    assert_eq!(run.pass_count(), 0);
    assert!(run.final_score().is_none());

    let error = run.error().unwrap();
    assert_eq!(error.kind, RunErrorKind::BackendFatal);
    assert_eq!(error.stage, WorkflowStage::StrategySelected);
    assert_eq!(backend.draft_calls(), 1);
    assert!(assessor.assessed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_transient_draft_error_is_retried() {
    let config = EngineConfig {
        retry: RetryPolicy::default(),
        ..EngineConfig::default()
    };
    let backend = Arc::new(ScriptedBackend::new().push_draft(Err(transient())));
    let assessor = Arc::new(ScriptedAssessor::new(&[7.0]));
    let engine = engine_with(config, backend.clone(), assessor);

    let run = engine.execute_workflow(untargeted_request()).await;

    assert_eq!(run.outcome(), Some(RunOutcome::Success));
    assert_eq!(backend.draft_calls(), 2);
    assert_eq!(run.artifact(), Some(DRAFT_TEXT));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_draft_retries_fail_run() {
    let config = EngineConfig {
        retry: RetryPolicy::default(),
        ..EngineConfig::default()
    };
    let backend = Arc::new(
        ScriptedBackend::new()
            .push_draft(Err(transient()))
            .push_draft(Err(transient()))
            .push_draft(Err(transient()))
            .push_draft(Err(transient())),
    );
    let assessor = Arc::new(ScriptedAssessor::new(&[7.0]));
    let engine = engine_with(config, backend.clone(), assessor.clone());

    let run = engine.execute_workflow(untargeted_request()).await;

    assert_eq!(run.stage(), WorkflowStage::Failed);
    assert_eq!(run.outcome(), Some(RunOutcome::Failed));
    assert_eq!(run.error().unwrap().kind, RunErrorKind::BackendFatal);
    // First attempt plus three retries
    assert_eq!(backend.draft_calls(), 4);
    assert!(run.artifact().is_none());
    assert_eq!(run.pass_count(), 0);
    assert!(assessor.assessed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_revision_retries_degrade_run() {
    let config = EngineConfig {
        retry: RetryPolicy::default(),
        ..EngineConfig::default()
    };
    let backend = Arc::new(
        ScriptedBackend::new()
            .push_revision(Err(transient()))
            .push_revision(Err(transient()))
            .push_revision(Err(transient()))
            .push_revision(Err(transient())),
    );
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5]));
    let engine = engine_with(config, backend.clone(), assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.stage(), WorkflowStage::Finalized);
    assert_eq!(run.outcome(), Some(RunOutcome::Degraded));
    assert_eq!(run.stop_reason(), Some(StopReason::EnhancementFailed));
    assert_eq!(backend.revise_calls(), 4);
    assert_eq!(run.pass_count(), 0);
    assert_eq!(run.final_score(), Some(6.5));
    assert_eq!(run.artifact(), Some(DRAFT_TEXT));

    let error = run.error().unwrap();
    assert_eq!(error.kind, RunErrorKind::BackendFatal);
    assert_eq!(error.stage, WorkflowStage::Enhancing);
}

#[tokio::test]
async fn test_invalid_request_fails_validation() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[7.0]));
    let engine = engine(backend.clone(), assessor);

    let request = GenerationRequestBuilder::new(Genre::Mystery, 2000)
        .quality_target(11.0)
        .build_unchecked();
    let run = engine.execute_workflow(request).await;

    assert_eq!(run.stage(), WorkflowStage::Failed);
    assert_eq!(run.outcome(), Some(RunOutcome::Failed));
    assert_eq!(run.error().unwrap().kind, RunErrorKind::Validation);
    assert!(run.plan().is_none());
    assert_eq!(backend.draft_calls(), 0);
}

#[tokio::test]
async fn test_enhancement_failure_degrades_to_best_artifact() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .push_revision(Ok("A tighter, sharper telling.".to_string()))
            .push_revision(Err(fatal())),
    );
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.2]));
    let engine = engine(backend.clone(), assessor);

    let run = engine.execute_workflow(mystery_request()).await;

    assert_eq!(run.stage(), WorkflowStage::Finalized);
    assert_eq!(run.outcome(), Some(RunOutcome::Degraded));
    assert_eq!(run.stop_reason(), Some(StopReason::EnhancementFailed));
    assert_eq!(run.pass_count(), 1);
    assert_eq!(run.final_score(), Some(7.2));
    assert_eq!(run.artifact(), Some("A tighter, sharper telling."));

    let error = run.error().unwrap();
    assert_eq!(error.kind, RunErrorKind::BackendFatal);
    assert_eq!(error.stage, WorkflowStage::Enhancing);
}

#[tokio::test]
async fn test_strict_success_fails_on_enhancement_error() {
    let backend = Arc::new(ScriptedBackend::new().push_revision(Err(fatal())));
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5]));
    let engine = engine(backend, assessor);

    let request = GenerationRequestBuilder::new(Genre::Mystery, 2000)
        .quality_target(8.0)
        .strict_success(true)
        .build()
        .unwrap();
    let run = engine.execute_workflow(request).await;

    assert_eq!(run.stage(), WorkflowStage::Failed);
    assert_eq!(run.outcome(), Some(RunOutcome::Failed));
    assert_eq!(run.error().unwrap().kind, RunErrorKind::BackendFatal);
    assert_eq!(run.artifact(), Some(DRAFT_TEXT));
}

#[tokio::test]
async fn test_unassessable_dimension_is_contained() {
    struct DialogueBlind;

    #[async_trait]
    impl DimensionAssessor for DialogueBlind {
        async fn assess_dimension(
            &self,
            dimension: QualityDimension,
            _artifact: &str,
            _request: &GenerationRequest,
        ) -> Result<f64, AssessmentError> {
            if dimension == QualityDimension::Dialogue {
                return Err(AssessmentError::Backend("critic unavailable".to_string()));
            }
            Ok(8.0)
        }
    }

    let pipeline = AssessmentPipeline::new(Arc::new(DialogueBlind), Arc::new(WeightTable::default()))
        .with_config(AssessmentConfig {
            dimension_timeout_secs: 5,
            parallel: true,
        });
    let backend = Arc::new(ScriptedBackend::new());
    let engine = engine(backend, Arc::new(pipeline));

    let run = engine.execute_workflow(untargeted_request()).await;

    assert_eq!(run.outcome(), Some(RunOutcome::Success));
    let profile = run.profile().unwrap();
    assert!(!profile.get(QualityDimension::Dialogue).unwrap().is_assessable());
    assert!(profile.get(QualityDimension::Pacing).unwrap().is_assessable());
    assert_eq!(
        profile.unassessable_dimensions(),
        vec![QualityDimension::Dialogue]
    );
    // Dialogue weighs 0.10 and counts as zero
    assert_eq!(run.final_score(), Some(7.2));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_start() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[7.0]));
    let engine = engine(backend.clone(), assessor);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let run = engine
        .execute_workflow_with_cancel(mystery_request(), cancel)
        .await;

    assert_eq!(run.outcome(), Some(RunOutcome::Failed));
    assert_eq!(run.error().unwrap().kind, RunErrorKind::Cancelled);
    assert_eq!(backend.draft_calls(), 0);
}

#[tokio::test]
async fn test_cancelled_during_enhancement_keeps_last_artifact() {
    let cancel = CancellationToken::new();
    let backend = Arc::new(ScriptedBackend::new().cancel_during_revision(cancel.clone()));
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.5]));
    let engine = engine(backend.clone(), assessor.clone());

    let run = engine
        .execute_workflow_with_cancel(mystery_request(), cancel)
        .await;

    assert_eq!(run.stage(), WorkflowStage::Failed);
    assert_eq!(run.outcome(), Some(RunOutcome::Failed));
    assert_eq!(run.error().unwrap().kind, RunErrorKind::Cancelled);
    assert_eq!(run.pass_count(), 0);
    assert_eq!(run.artifact(), Some(DRAFT_TEXT));
    assert_eq!(backend.revise_calls(), 1);
    // The revision was never assessed
    assert_eq!(assessor.assessed().len(), 1);
}

// ============================================================================
// Streaming, Telemetry and History
// ============================================================================

#[tokio::test]
async fn test_streaming_events_follow_the_stage_machine() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.8, 8.1]));
    let engine = engine(backend, assessor);

    let (tx, mut rx) = mpsc::channel(256);
    let run = engine
        .execute_workflow_streaming(mystery_request(), CancellationToken::new(), tx)
        .await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(events.iter().all(|e| e.run_id() == run.id()));

    let stages: Vec<WorkflowStage> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::StageEntered { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            WorkflowStage::Analyzed,
            WorkflowStage::StrategySelected,
            WorkflowStage::Drafted,
            WorkflowStage::Assessed,
            WorkflowStage::Enhancing,
            WorkflowStage::Assessed,
            WorkflowStage::Enhancing,
            WorkflowStage::Assessed,
            WorkflowStage::Finalized,
        ]
    );

    let assessed: Vec<(u32, f64)> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::Assessed {
                pass_number,
                overall,
                ..
            } => Some((*pass_number, *overall)),
            _ => None,
        })
        .collect();
    assert_eq!(assessed, vec![(0, 6.5), (1, 7.8), (2, 8.1)]);

    assert!(events.iter().any(|e| matches!(
        e,
        WorkflowEvent::DraftReady { outlined: true, .. }
    )));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, WorkflowEvent::PassCompleted { .. }))
            .count(),
        2
    );
    match events.last() {
        Some(WorkflowEvent::Finished { run: finished }) => {
            assert_eq!(finished.outcome(), Some(RunOutcome::Success));
        }
        other => panic!("expected Finished last, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dropped_event_receiver_does_not_affect_run() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.8, 8.1]));
    let engine = engine(backend, assessor);

    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let run = engine
        .execute_workflow_streaming(mystery_request(), CancellationToken::new(), tx)
        .await;

    assert_eq!(run.outcome(), Some(RunOutcome::Success));
    assert_eq!(run.pass_count(), 2);
}

#[tokio::test]
async fn test_telemetry_records_stages_and_outcomes() {
    let telemetry = Arc::new(TelemetryRecorder::new(64));
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.8, 8.1]));
    let engine = engine(backend, assessor).with_telemetry(telemetry.clone());

    engine.execute_workflow(mystery_request()).await;

    let snapshot = telemetry.snapshot().await.unwrap();
    assert_eq!(snapshot.runs_completed, 1);
    assert_eq!(snapshot.outcomes.get("success"), Some(&1));
    assert_eq!(snapshot.stages["drafted"].count, 1);
    assert_eq!(snapshot.stages["enhancing"].count, 2);
    assert_eq!(snapshot.stages["enhancing"].failures, 0);
    assert_eq!(snapshot.dropped_events, 0);

    telemetry.shutdown().await;
}

#[tokio::test]
async fn test_history_and_strategy_statistics() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[6.5, 7.8, 8.1, 7.0]));
    let engine = engine(backend, assessor);

    let iterative = engine.execute_workflow(mystery_request()).await;
    let direct = engine.execute_workflow(untargeted_request()).await;
    let invalid = engine
        .execute_workflow(GenerationRequestBuilder::new(Genre::Fantasy, 0).build_unchecked())
        .await;

    let recent = engine.recent_runs(10).await;
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].id, invalid.id());
    assert_eq!(recent[1].id, direct.id());
    assert_eq!(recent[2].id, iterative.id());
    assert_eq!(recent[0].outcome, Some(RunOutcome::Failed));
    assert_eq!(recent[0].strategy, None);

    let stats = engine.strategy_statistics().await;
    assert_eq!(stats.len(), 2);
    let direct_stats = stats
        .iter()
        .find(|s| s.strategy == GenerationStrategy::Direct)
        .unwrap();
    assert_eq!(direct_stats.runs, 1);
    assert_eq!(direct_stats.success_rate, 1.0);
    assert_eq!(direct_stats.mean_final_score, Some(7.0));
    let iterative_stats = stats
        .iter()
        .find(|s| s.strategy == GenerationStrategy::Iterative)
        .unwrap();
    assert_eq!(iterative_stats.mean_passes, 2.0);
    assert_eq!(iterative_stats.mean_final_score, Some(8.1));
}

#[tokio::test]
async fn test_concurrent_runs_share_one_engine() {
    let backend = Arc::new(ScriptedBackend::new());
    let assessor = Arc::new(ScriptedAssessor::new(&[7.0]));
    let engine = engine(backend.clone(), assessor);

    let (a, b) = tokio::join!(
        engine.execute_workflow(untargeted_request()),
        engine.execute_workflow(untargeted_request()),
    );

    assert_ne!(a.id(), b.id());
    assert_eq!(a.outcome(), Some(RunOutcome::Success));
    assert_eq!(b.outcome(), Some(RunOutcome::Success));
    assert_eq!(backend.draft_calls(), 2);
    assert_eq!(engine.history().len().await, 2);
}
