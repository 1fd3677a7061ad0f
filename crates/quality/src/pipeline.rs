//! Concurrent Assessment Pipeline
//!
//! Scores an artifact on every quality dimension through a pluggable
//! `DimensionAssessor`, then aggregates the results into a `QualityProfile`.
//!
//! Dimensions are scored independently against the same immutable artifact,
//! so they run concurrently (`join_all`) unless `parallel` is disabled. The
//! pipeline waits for every dimension before aggregating.
//!
//! A dimension that errors, times out or returns a value outside [0, 10] is
//! recorded as unassessable. An empty artifact is unassessable on every
//! dimension without calling the assessor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use story_forge_core::{GenerationRequest, QualityDimension, MAX_QUALITY_SCORE};
use tracing::{debug, warn};

use crate::models::{AssessmentError, DimensionScore, QualityProfile, WeightTable};

// ============================================================================
// Assessor Traits
// ============================================================================

/// Scores one dimension of an artifact.
#[async_trait]
pub trait DimensionAssessor: Send + Sync {
    async fn assess_dimension(
        &self,
        dimension: QualityDimension,
        artifact: &str,
        request: &GenerationRequest,
    ) -> Result<f64, AssessmentError>;
}

/// Produces a complete profile for an artifact. Never fails: problems with
/// individual dimensions are folded into the profile as unassessable.
#[async_trait]
pub trait QualityAssessor: Send + Sync {
    async fn assess(&self, artifact: &str, request: &GenerationRequest) -> QualityProfile;
}

// ============================================================================
// Pipeline Config
// ============================================================================

fn default_dimension_timeout_secs() -> u64 {
    60
}

fn default_parallel() -> bool {
    true
}

/// Assessment pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentConfig {
    /// Per-dimension timeout in seconds
    #[serde(default = "default_dimension_timeout_secs")]
    pub dimension_timeout_secs: u64,
    /// Score dimensions concurrently
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            dimension_timeout_secs: default_dimension_timeout_secs(),
            parallel: default_parallel(),
        }
    }
}

impl AssessmentConfig {
    pub fn dimension_timeout(&self) -> Duration {
        Duration::from_secs(self.dimension_timeout_secs)
    }
}

// ============================================================================
// Assessment Pipeline
// ============================================================================

/// Fans an artifact out to a dimension assessor and aggregates the results.
pub struct AssessmentPipeline {
    assessor: Arc<dyn DimensionAssessor>,
    weights: Arc<WeightTable>,
    config: AssessmentConfig,
}

impl AssessmentPipeline {
    pub fn new(assessor: Arc<dyn DimensionAssessor>, weights: Arc<WeightTable>) -> Self {
        Self {
            assessor,
            weights,
            config: AssessmentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AssessmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Score one dimension, converting every failure into the sentinel.
    async fn score_dimension(
        &self,
        dimension: QualityDimension,
        artifact: &str,
        request: &GenerationRequest,
    ) -> (QualityDimension, DimensionScore) {
        let timeout = self.config.dimension_timeout();
        let outcome = match tokio::time::timeout(
            timeout,
            self.assessor.assess_dimension(dimension, artifact, request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AssessmentError::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        };

        let outcome = outcome.and_then(|value| {
            if value.is_finite() && (0.0..=MAX_QUALITY_SCORE).contains(&value) {
                Ok(value)
            } else {
                Err(AssessmentError::OutOfRange(value))
            }
        });

        match outcome {
            Ok(value) => {
                debug!(dimension = %dimension, score = value, "dimension assessed");
                (dimension, DimensionScore::scored(value))
            }
            Err(err) => {
                warn!(dimension = %dimension, error = %err, "dimension unassessable");
                (dimension, DimensionScore::unassessable(err.to_string()))
            }
        }
    }
}

#[async_trait]
impl QualityAssessor for AssessmentPipeline {
    async fn assess(&self, artifact: &str, request: &GenerationRequest) -> QualityProfile {
        if artifact.trim().is_empty() {
            warn!("artifact is empty, every dimension is unassessable");
            return QualityProfile::unassessable(
                &AssessmentError::EmptyArtifact.to_string(),
                &self.weights,
            );
        }

        let results = if self.config.parallel {
            let futures = QualityDimension::ALL
                .iter()
                .map(|d| self.score_dimension(*d, artifact, request));
            futures_util::future::join_all(futures).await
        } else {
            let mut results = Vec::with_capacity(QualityDimension::COUNT);
            for dimension in QualityDimension::ALL {
                results.push(self.score_dimension(dimension, artifact, request).await);
            }
            results
        };

        QualityProfile::assemble(results.into_iter().collect(), &self.weights)
    }
}
