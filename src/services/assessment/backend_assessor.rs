//! Backend Dimension Assessor
//!
//! Scores one quality dimension by asking a completion backend to act as a
//! critic, then pulls the first number in [0, 10] out of the reply.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use story_forge_core::{GenerationRequest, QualityDimension, MAX_QUALITY_SCORE};
use story_forge_llm::prompts::{scoring_prompt, CRITIC_SYSTEM_PROMPT};
use story_forge_llm::{CallContext, CancellationToken, CompletionBackend};
use story_forge_quality::{AssessmentError, DimensionAssessor};
use tracing::debug;

use crate::utils::error::{AppError, AppResult};

const SCORE_PATTERN: &str = r"\d+(?:\.\d+)?";

/// `DimensionAssessor` backed by a completion service.
pub struct BackendDimensionAssessor {
    completion: Arc<dyn CompletionBackend>,
    call_timeout: Duration,
    score_pattern: Regex,
}

impl BackendDimensionAssessor {
    pub fn new(completion: Arc<dyn CompletionBackend>, call_timeout: Duration) -> AppResult<Self> {
        let score_pattern = Regex::new(SCORE_PATTERN)
            .map_err(|e| AppError::internal(format!("invalid score pattern: {}", e)))?;
        Ok(Self {
            completion,
            call_timeout,
            score_pattern,
        })
    }

    /// First number in the reply that falls within the score range.
    pub fn extract_score(&self, reply: &str) -> Option<f64> {
        self.score_pattern
            .find_iter(reply)
            .filter_map(|m| m.as_str().parse::<f64>().ok())
            .find(|v| (0.0..=MAX_QUALITY_SCORE).contains(v))
    }
}

#[async_trait]
impl DimensionAssessor for BackendDimensionAssessor {
    async fn assess_dimension(
        &self,
        dimension: QualityDimension,
        artifact: &str,
        request: &GenerationRequest,
    ) -> Result<f64, AssessmentError> {
        let ctx = CallContext::new(CancellationToken::new(), self.call_timeout);
        let prompt = scoring_prompt(dimension, artifact, request);

        let reply = self
            .completion
            .complete(Some(CRITIC_SYSTEM_PROMPT), &prompt, &ctx)
            .await
            .map_err(|e| AssessmentError::Backend(e.to_string()))?;

        let score = self.extract_score(&reply).ok_or_else(|| {
            let mut excerpt: String = reply.chars().take(80).collect();
            if excerpt.is_empty() {
                excerpt = "<empty reply>".to_string();
            }
            AssessmentError::Unparseable(excerpt)
        })?;

        debug!(dimension = %dimension, score, "Dimension scored");
        Ok(score)
    }
}
