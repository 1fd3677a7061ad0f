//! Test doubles shared by the integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use story_forge::{EngineConfig, WorkflowEngine};
use story_forge_core::GenerationRequest;
use story_forge_llm::{
    BackendError, BackendResult, CallContext, CancellationToken, DraftKind, DraftParams,
    RetryPolicy, RevisionHint, TextBackend,
};
use story_forge_quality::{QualityAssessor, QualityProfile, WeightTable};

pub const DRAFT_TEXT: &str = "The lighthouse keeper found the ledger soaked in brine.\n\n\
\"Who wrote this?\" she asked.\n\nNobody answered.";

pub const OUTLINE_TEXT: &str = "1. Discovery\n2. Suspicion\n3. Confrontation\n4. Resolution";

// ============================================================================
// Scripted Backend
// ============================================================================

/// Backend that replays queued results. Story drafts and revisions fall back
/// to fixed text once their queue is empty.
#[derive(Default)]
pub struct ScriptedBackend {
    drafts: Mutex<VecDeque<BackendResult<String>>>,
    revisions: Mutex<VecDeque<BackendResult<String>>>,
    draft_calls: AtomicUsize,
    outline_calls: AtomicUsize,
    revise_calls: AtomicUsize,
    hints: Mutex<Vec<RevisionHint>>,
    cancel_on_revise: Mutex<Option<CancellationToken>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next draft call (outline or story).
    pub fn push_draft(self, result: BackendResult<String>) -> Self {
        self.drafts.lock().unwrap().push_back(result);
        self
    }

    pub fn push_revision(self, result: BackendResult<String>) -> Self {
        self.revisions.lock().unwrap().push_back(result);
        self
    }

    /// Cancel `token` from inside the first revision call.
    pub fn cancel_during_revision(self, token: CancellationToken) -> Self {
        *self.cancel_on_revise.lock().unwrap() = Some(token);
        self
    }

    pub fn draft_calls(&self) -> usize {
        self.draft_calls.load(Ordering::SeqCst)
    }

    pub fn outline_calls(&self) -> usize {
        self.outline_calls.load(Ordering::SeqCst)
    }

    pub fn revise_calls(&self) -> usize {
        self.revise_calls.load(Ordering::SeqCst)
    }

    pub fn hints(&self) -> Vec<RevisionHint> {
        self.hints.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_draft(
        &self,
        params: &DraftParams,
        _ctx: &CallContext,
    ) -> BackendResult<String> {
        self.draft_calls.fetch_add(1, Ordering::SeqCst);
        let is_outline = matches!(params.kind, DraftKind::Outline);
        if is_outline {
            self.outline_calls.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(result) = self.drafts.lock().unwrap().pop_front() {
            return result;
        }
        if is_outline {
            Ok(OUTLINE_TEXT.to_string())
        } else {
            Ok(DRAFT_TEXT.to_string())
        }
    }

    async fn revise_artifact(
        &self,
        artifact: &str,
        hint: &RevisionHint,
        _ctx: &CallContext,
    ) -> BackendResult<String> {
        let n = self.revise_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.hints.lock().unwrap().push(hint.clone());
        if let Some(token) = self.cancel_on_revise.lock().unwrap().take() {
            token.cancel();
        }
        if let Some(result) = self.revisions.lock().unwrap().pop_front() {
            return result;
        }
        Ok(format!("{}\n\nRevision {}.", artifact, n))
    }
}

// ============================================================================
// Scripted Assessor
// ============================================================================

/// Assessor that returns uniform profiles from a queue of overall scores,
/// repeating the last score once the queue runs dry.
pub struct ScriptedAssessor {
    scores: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
    weights: WeightTable,
    assessed: Mutex<Vec<String>>,
}

impl ScriptedAssessor {
    pub fn new(scores: &[f64]) -> Self {
        Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            last: Mutex::new(scores.last().copied().unwrap_or(5.0)),
            weights: WeightTable::default(),
            assessed: Mutex::new(Vec::new()),
        }
    }

    /// Artifacts in the order they were assessed.
    pub fn assessed(&self) -> Vec<String> {
        self.assessed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QualityAssessor for ScriptedAssessor {
    async fn assess(&self, artifact: &str, _request: &GenerationRequest) -> QualityProfile {
        self.assessed.lock().unwrap().push(artifact.to_string());
        let score = match self.scores.lock().unwrap().pop_front() {
            Some(score) => {
                *self.last.lock().unwrap() = score;
                score
            }
            None => *self.last.lock().unwrap(),
        };
        QualityProfile::uniform(score, &self.weights).expect("scripted score in range")
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Default configuration without retry backoff.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy::none(),
        ..EngineConfig::default()
    }
}

pub fn engine(
    backend: Arc<ScriptedBackend>,
    assessor: Arc<dyn QualityAssessor>,
) -> WorkflowEngine {
    engine_with(test_config(), backend, assessor)
}

pub fn engine_with(
    config: EngineConfig,
    backend: Arc<ScriptedBackend>,
    assessor: Arc<dyn QualityAssessor>,
) -> WorkflowEngine {
    WorkflowEngine::new(Arc::new(config), backend, assessor).expect("valid engine config")
}

pub fn fatal() -> BackendError {
    BackendError::AuthenticationFailed {
        message: "invalid API key".to_string(),
    }
}

pub fn transient() -> BackendError {
    BackendError::ServerError {
        message: "upstream unavailable".to_string(),
        status: Some(503),
    }
}
