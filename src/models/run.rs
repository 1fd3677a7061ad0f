//! Workflow Run Models
//!
//! `WorkflowRun` is the aggregate root of one request's execution. It is
//! mutated only by the workflow engine (all mutators are crate-private) and
//! becomes read-only once it reaches `Finalized` or `Failed`.
//!
//! ## Best candidate
//!
//! The run keeps the highest-scoring artifact seen so far (the draft counts;
//! an earlier candidate wins ties). Finalization installs that candidate as
//! the run's artifact and profile, so a regressing pass never lowers the
//! delivered score below the first draft's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use story_forge_core::{CoreError, CoreResult, GenerationRequest, WorkflowStage};
use story_forge_quality::{round2, QualityFeedback, QualityProfile};
use uuid::Uuid;

use crate::models::enhancement::EnhancementStrategyKind;
use crate::models::strategy::{GenerationStrategy, StrategyPlan};

// ============================================================================
// Outcome & Errors
// ============================================================================

/// Terminal classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Target met, or no target requested
    Success,
    /// Usable result that did not meet the target
    Degraded,
    /// Terminated abnormally
    Failed,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "success"),
            RunOutcome::Degraded => write!(f, "degraded"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Why enhancement stopped. Normal terminations, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No quality target; the draft is final
    NoTarget,
    TargetMet,
    /// Successive passes gained too little
    Converged,
    /// The last pass lowered the overall score
    Regressed,
    /// Pass budget spent
    BudgetExhausted,
    /// Run time budget spent
    TimeBudgetExhausted,
    /// A backend failure during a pass ended enhancement early
    EnhancementFailed,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::NoTarget => "no_target",
            StopReason::TargetMet => "target_met",
            StopReason::Converged => "converged",
            StopReason::Regressed => "regressed",
            StopReason::BudgetExhausted => "budget_exhausted",
            StopReason::TimeBudgetExhausted => "time_budget_exhausted",
            StopReason::EnhancementFailed => "enhancement_failed",
        };
        write!(f, "{}", s)
    }
}

/// Category of a run-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    /// Bad request shape
    Validation,
    /// Backend failed fatally or exhausted its retries
    BackendFatal,
    /// The caller cancelled the run
    Cancelled,
    /// Invariant violation inside the engine
    Internal,
}

impl std::fmt::Display for RunErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunErrorKind::Validation => write!(f, "validation"),
            RunErrorKind::BackendFatal => write!(f, "backend_fatal"),
            RunErrorKind::Cancelled => write!(f, "cancelled"),
            RunErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Structured error recorded on a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunError {
    pub kind: RunErrorKind,
    pub message: String,
    /// Stage the run was in when the error occurred
    pub stage: WorkflowStage,
}

impl RunError {
    pub fn new(kind: RunErrorKind, stage: WorkflowStage, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stage,
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error during {}: {}", self.kind, self.stage, self.message)
    }
}

// ============================================================================
// Enhancement Pass
// ============================================================================

/// One refinement iteration. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementPass {
    /// 1-based, monotonic within a run
    pub pass_number: u32,
    pub strategy: EnhancementStrategyKind,
    pub before: QualityProfile,
    pub after: QualityProfile,
    pub changes: Vec<String>,
    pub duration_ms: u64,
}

impl EnhancementPass {
    /// Overall-score change produced by this pass, rounded to 2 decimals.
    pub fn delta(&self) -> f64 {
        round2(self.after.overall() - self.before.overall())
    }
}

// ============================================================================
// Workflow Run
// ============================================================================

/// Highest-scoring artifact observed in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestCandidate {
    pub artifact: String,
    pub profile: QualityProfile,
    /// 0 for the draft
    pub pass_number: u32,
}

/// Aggregate root of one request's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    id: Uuid,
    request: GenerationRequest,
    stage: WorkflowStage,
    plan: Option<StrategyPlan>,
    outline: Option<String>,
    artifact: Option<String>,
    profile: Option<QualityProfile>,
    initial_profile: Option<QualityProfile>,
    best: Option<BestCandidate>,
    passes: Vec<EnhancementPass>,
    outcome: Option<RunOutcome>,
    stop_reason: Option<StopReason>,
    error: Option<RunError>,
    feedback: Option<QualityFeedback>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    duration_ms: u64,
}

impl WorkflowRun {
    pub(crate) fn new(request: GenerationRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            stage: WorkflowStage::Received,
            plan: None,
            outline: None,
            artifact: None,
            profile: None,
            initial_profile: None,
            best: None,
            passes: Vec::new(),
            outcome: None,
            stop_reason: None,
            error: None,
            feedback: None,
            created_at: Utc::now(),
            completed_at: None,
            duration_ms: 0,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    pub fn plan(&self) -> Option<&StrategyPlan> {
        self.plan.as_ref()
    }

    pub fn strategy(&self) -> Option<GenerationStrategy> {
        self.plan.as_ref().map(|p| p.strategy)
    }

    pub fn outline(&self) -> Option<&str> {
        self.outline.as_deref()
    }

    /// Current artifact; after finalization, the best candidate.
    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn profile(&self) -> Option<&QualityProfile> {
        self.profile.as_ref()
    }

    /// Profile of the first scored draft.
    pub fn initial_profile(&self) -> Option<&QualityProfile> {
        self.initial_profile.as_ref()
    }

    pub fn best(&self) -> Option<&BestCandidate> {
        self.best.as_ref()
    }

    pub fn passes(&self) -> &[EnhancementPass] {
        &self.passes
    }

    pub fn pass_count(&self) -> u32 {
        self.passes.len() as u32
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn error(&self) -> Option<&RunError> {
        self.error.as_ref()
    }

    pub fn feedback(&self) -> Option<&QualityFeedback> {
        self.feedback.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn final_score(&self) -> Option<f64> {
        self.profile.as_ref().map(|p| p.overall())
    }

    /// Condensed view for reporting.
    pub fn summary(&self) -> RunSummary {
        let most_effective = self
            .passes
            .iter()
            .filter(|p| p.delta() > 0.0)
            .fold(None::<&EnhancementPass>, |best, p| match best {
                Some(b) if b.delta() >= p.delta() => Some(b),
                _ => Some(p),
            })
            .map(|p| p.strategy);

        RunSummary {
            id: self.id,
            genre: self.request.genre.to_string(),
            strategy: self.strategy(),
            pass_count: self.pass_count(),
            initial_score: self.initial_profile.as_ref().map(|p| p.overall()),
            final_score: self.final_score(),
            outcome: self.outcome,
            stop_reason: self.stop_reason,
            most_effective_strategy: most_effective,
            duration_ms: self.duration_ms,
            completed_at: self.completed_at,
        }
    }

    // ------------------------------------------------------------------
    // Engine-only mutation
    // ------------------------------------------------------------------

    fn ensure_live(&self, next: WorkflowStage) -> CoreResult<()> {
        if self.stage.is_terminal() {
            return Err(CoreError::invalid_transition(self.stage, next));
        }
        Ok(())
    }

    pub(crate) fn advance(&mut self, next: WorkflowStage) -> CoreResult<()> {
        self.stage = self.stage.transition(next)?;
        Ok(())
    }

    pub(crate) fn set_plan(&mut self, plan: StrategyPlan) -> CoreResult<()> {
        self.ensure_live(WorkflowStage::StrategySelected)?;
        self.plan = Some(plan);
        Ok(())
    }

    pub(crate) fn set_outline(&mut self, outline: String) -> CoreResult<()> {
        self.ensure_live(WorkflowStage::Drafted)?;
        self.outline = Some(outline);
        Ok(())
    }

    pub(crate) fn set_artifact(&mut self, artifact: String) -> CoreResult<()> {
        self.ensure_live(WorkflowStage::Drafted)?;
        self.artifact = Some(artifact);
        Ok(())
    }

    /// Record the first assessment of the draft.
    pub(crate) fn record_initial_profile(&mut self, profile: QualityProfile) -> CoreResult<()> {
        self.ensure_live(WorkflowStage::Assessed)?;
        let artifact = self
            .artifact
            .clone()
            .ok_or_else(|| CoreError::internal("draft assessed before it was generated"))?;
        self.best = Some(BestCandidate {
            artifact,
            profile: profile.clone(),
            pass_number: 0,
        });
        self.initial_profile = Some(profile.clone());
        self.profile = Some(profile);
        Ok(())
    }

    /// Append a completed pass and make its output the current artifact.
    pub(crate) fn record_pass(&mut self, pass: EnhancementPass, artifact: String) -> CoreResult<()> {
        self.ensure_live(WorkflowStage::Assessed)?;
        let expected = self.pass_count() + 1;
        if pass.pass_number != expected {
            return Err(CoreError::internal(format!(
                "pass number {} recorded out of order, expected {}",
                pass.pass_number, expected
            )));
        }

        let improves = self
            .best
            .as_ref()
            .map(|b| pass.after.overall() > b.profile.overall())
            .unwrap_or(true);
        if improves {
            self.best = Some(BestCandidate {
                artifact: artifact.clone(),
                profile: pass.after.clone(),
                pass_number: pass.pass_number,
            });
        }

        self.profile = Some(pass.after.clone());
        self.artifact = Some(artifact);
        self.passes.push(pass);
        Ok(())
    }

    fn complete(&mut self, elapsed_ms: u64) {
        self.completed_at = Some(Utc::now());
        self.duration_ms = elapsed_ms;
    }

    /// Enter `Finalized` with the best candidate installed.
    pub(crate) fn finalize(
        &mut self,
        outcome: RunOutcome,
        stop_reason: StopReason,
        error: Option<RunError>,
        elapsed_ms: u64,
    ) -> CoreResult<()> {
        self.advance(WorkflowStage::Finalized)?;
        if let Some(best) = self.best.clone() {
            self.artifact = Some(best.artifact);
            self.profile = Some(best.profile);
        }
        self.feedback = self.profile.as_ref().map(QualityFeedback::from_profile);
        self.outcome = Some(outcome);
        self.stop_reason = Some(stop_reason);
        self.error = error;
        self.complete(elapsed_ms);
        Ok(())
    }

    /// Enter `Failed`, keeping whatever artifact the run last held.
    pub(crate) fn fail(&mut self, error: RunError, elapsed_ms: u64) -> CoreResult<()> {
        self.advance(WorkflowStage::Failed)?;
        self.outcome = Some(RunOutcome::Failed);
        self.error = Some(error);
        self.complete(elapsed_ms);
        Ok(())
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Condensed, reporting-oriented view of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: Uuid,
    pub genre: String,
    pub strategy: Option<GenerationStrategy>,
    pub pass_count: u32,
    pub initial_score: Option<f64>,
    pub final_score: Option<f64>,
    pub outcome: Option<RunOutcome>,
    pub stop_reason: Option<StopReason>,
    /// Strategy of the pass with the largest positive gain
    pub most_effective_strategy: Option<EnhancementStrategyKind>,
    pub duration_ms: u64,
    pub completed_at: Option<DateTime<Utc>>,
}
