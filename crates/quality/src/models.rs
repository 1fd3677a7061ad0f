//! Quality Profile Models
//!
//! Per-dimension scores, the weighted aggregate and the tables that drive it.
//!
//! ## Aggregation
//!
//! `overall = round2(Σ weight(d) · score(d) / Σ weight(d))` over every
//! dimension. An unassessable dimension contributes the minimum score (0.0),
//! it is never omitted. Aggregation is a pure function of the scores and the
//! weight table, so a recorded profile can always be re-aggregated offline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use story_forge_core::{CoreError, CoreResult, QualityDimension, MAX_QUALITY_SCORE};
use thiserror::Error;

/// Score contributed by an unassessable dimension.
pub const UNASSESSABLE_SCORE: f64 = 0.0;

/// Round to two decimals, the precision profiles are reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn is_valid_score(value: f64) -> bool {
    value.is_finite() && (0.0..=MAX_QUALITY_SCORE).contains(&value)
}

// ============================================================================
// Assessment Error
// ============================================================================

/// Failure to score a single dimension. Contained by the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssessmentError {
    #[error("artifact is empty")]
    EmptyArtifact,

    #[error("assessment backend failed: {0}")]
    Backend(String),

    #[error("could not parse a score from: {0}")]
    Unparseable(String),

    #[error("score {0} is outside [0, 10]")]
    OutOfRange(f64),

    #[error("assessment timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

// ============================================================================
// Dimension Score
// ============================================================================

/// Result of scoring one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DimensionScore {
    Scored { value: f64 },
    /// Sentinel for a dimension that could not be scored; aggregates as the
    /// minimum score.
    Unassessable { reason: String },
}

impl DimensionScore {
    pub fn scored(value: f64) -> Self {
        DimensionScore::Scored { value }
    }

    pub fn unassessable(reason: impl Into<String>) -> Self {
        DimensionScore::Unassessable {
            reason: reason.into(),
        }
    }

    /// Value used for aggregation and deficit computation.
    pub fn value(&self) -> f64 {
        match self {
            DimensionScore::Scored { value } => *value,
            DimensionScore::Unassessable { .. } => UNASSESSABLE_SCORE,
        }
    }

    pub fn is_assessable(&self) -> bool {
        matches!(self, DimensionScore::Scored { .. })
    }
}

// ============================================================================
// Weight Table
// ============================================================================

/// Per-dimension weights for the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct WeightTable {
    weights: BTreeMap<QualityDimension, f64>,
}

impl Default for WeightTable {
    fn default() -> Self {
        use QualityDimension::*;
        let weights = [
            (Structure, 0.12),
            (Coherence, 0.10),
            (GenreCompliance, 0.08),
            (CharacterDevelopment, 0.12),
            (Pacing, 0.10),
            (ThemeIntegration, 0.08),
            (Dialogue, 0.10),
            (SettingImmersion, 0.08),
            (EmotionalImpact, 0.12),
            (Originality, 0.06),
            (TechnicalQuality, 0.04),
        ]
        .into_iter()
        .collect();
        Self { weights }
    }
}

impl WeightTable {
    /// Build a table from explicit weights. Call `validate` before use.
    pub fn from_weights(weights: impl IntoIterator<Item = (QualityDimension, f64)>) -> Self {
        Self {
            weights: weights.into_iter().collect(),
        }
    }

    /// Same weight for every dimension.
    pub fn equal() -> Self {
        Self::from_weights(QualityDimension::ALL.iter().map(|d| (*d, 1.0)))
    }

    pub fn weight(&self, dimension: QualityDimension) -> f64 {
        self.weights.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Every dimension present, weights finite and non-negative, sum positive.
    pub fn validate(&self) -> CoreResult<()> {
        for dimension in QualityDimension::ALL {
            match self.weights.get(&dimension) {
                None => {
                    return Err(CoreError::config(format!(
                        "weight table is missing dimension '{}'",
                        dimension
                    )))
                }
                Some(w) if !w.is_finite() || *w < 0.0 => {
                    return Err(CoreError::config(format!(
                        "weight for '{}' must be a non-negative number, got {}",
                        dimension, w
                    )))
                }
                Some(_) => {}
            }
        }
        if self.total() <= 0.0 {
            return Err(CoreError::config("weight table must sum to more than zero"));
        }
        Ok(())
    }

    /// Weighted mean of `score_of` over every dimension, rounded to 2 decimals.
    pub fn aggregate<F>(&self, score_of: F) -> f64
    where
        F: Fn(QualityDimension) -> f64,
    {
        let total = self.total();
        if total <= 0.0 {
            return UNASSESSABLE_SCORE;
        }
        let weighted: f64 = QualityDimension::ALL
            .iter()
            .map(|d| self.weight(*d) * score_of(*d))
            .sum();
        round2(weighted / total)
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightTable {
    type Error = CoreError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut weights = BTreeMap::new();
        for (key, weight) in raw {
            weights.insert(QualityDimension::parse(&key)?, weight);
        }
        Ok(Self { weights })
    }
}

impl From<WeightTable> for BTreeMap<String, f64> {
    fn from(table: WeightTable) -> Self {
        table
            .weights
            .into_iter()
            .map(|(d, w)| (d.key().to_string(), w))
            .collect()
    }
}

// ============================================================================
// Dimension Targets
// ============================================================================

/// Optional per-dimension ceilings for deficit computation. Dimensions that
/// are not listed use the scale maximum (10.0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct DimensionTargets {
    overrides: BTreeMap<QualityDimension, f64>,
}

impl DimensionTargets {
    pub fn with_override(mut self, dimension: QualityDimension, target: f64) -> Self {
        self.overrides.insert(dimension, target);
        self
    }

    pub fn target(&self, dimension: QualityDimension) -> f64 {
        self.overrides
            .get(&dimension)
            .copied()
            .unwrap_or(MAX_QUALITY_SCORE)
    }

    /// `max(target - score, 0)` for one dimension.
    pub fn deficit(&self, profile: &QualityProfile, dimension: QualityDimension) -> f64 {
        (self.target(dimension) - profile.score(dimension)).max(0.0)
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (dimension, target) in &self.overrides {
            if !is_valid_score(*target) {
                return Err(CoreError::config(format!(
                    "target for '{}' must be within [0, 10], got {}",
                    dimension, target
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, f64>> for DimensionTargets {
    type Error = CoreError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut overrides = BTreeMap::new();
        for (key, target) in raw {
            overrides.insert(QualityDimension::parse(&key)?, target);
        }
        Ok(Self { overrides })
    }
}

impl From<DimensionTargets> for BTreeMap<String, f64> {
    fn from(targets: DimensionTargets) -> Self {
        targets
            .overrides
            .into_iter()
            .map(|(d, t)| (d.key().to_string(), t))
            .collect()
    }
}

// ============================================================================
// Quality Profile
// ============================================================================

/// Scores for every dimension plus the weighted overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfile {
    scores: BTreeMap<QualityDimension, DimensionScore>,
    overall: f64,
}

impl QualityProfile {
    /// Build a profile from a complete set of dimension scores.
    ///
    /// Fails if any dimension is missing or a scored value is outside [0, 10].
    pub fn from_scores(
        scores: BTreeMap<QualityDimension, DimensionScore>,
        weights: &WeightTable,
    ) -> CoreResult<Self> {
        for dimension in QualityDimension::ALL {
            match scores.get(&dimension) {
                None => {
                    return Err(CoreError::validation(format!(
                        "quality profile is missing dimension '{}'",
                        dimension
                    )))
                }
                Some(DimensionScore::Scored { value }) if !is_valid_score(*value) => {
                    return Err(CoreError::validation(format!(
                        "score for '{}' must be within [0, 10], got {}",
                        dimension, value
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(Self::assemble(scores, weights))
    }

    /// Build a profile from plain values.
    pub fn from_values(
        values: impl IntoIterator<Item = (QualityDimension, f64)>,
        weights: &WeightTable,
    ) -> CoreResult<Self> {
        let scores = values
            .into_iter()
            .map(|(d, v)| (d, DimensionScore::scored(v)))
            .collect();
        Self::from_scores(scores, weights)
    }

    /// Every dimension at the same score.
    pub fn uniform(score: f64, weights: &WeightTable) -> CoreResult<Self> {
        Self::from_values(QualityDimension::ALL.iter().map(|d| (*d, score)), weights)
    }

    /// Every dimension unassessable, for an artifact that cannot be scored.
    pub fn unassessable(reason: &str, weights: &WeightTable) -> Self {
        let scores = QualityDimension::ALL
            .iter()
            .map(|d| (*d, DimensionScore::unassessable(reason)))
            .collect();
        Self::assemble(scores, weights)
    }

    /// Fill any missing dimension as unassessable and aggregate.
    pub(crate) fn assemble(
        mut scores: BTreeMap<QualityDimension, DimensionScore>,
        weights: &WeightTable,
    ) -> Self {
        for dimension in QualityDimension::ALL {
            scores
                .entry(dimension)
                .or_insert_with(|| DimensionScore::unassessable("not assessed"));
        }
        let overall = weights.aggregate(|d| scores.get(&d).map(|s| s.value()).unwrap_or(0.0));
        Self { scores, overall }
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }

    /// Aggregation value for one dimension.
    pub fn score(&self, dimension: QualityDimension) -> f64 {
        self.scores
            .get(&dimension)
            .map(|s| s.value())
            .unwrap_or(UNASSESSABLE_SCORE)
    }

    pub fn get(&self, dimension: QualityDimension) -> Option<&DimensionScore> {
        self.scores.get(&dimension)
    }

    /// Dimensions in canonical order with their results.
    pub fn iter(&self) -> impl Iterator<Item = (QualityDimension, &DimensionScore)> {
        self.scores.iter().map(|(d, s)| (*d, s))
    }

    pub fn unassessable_dimensions(&self) -> Vec<QualityDimension> {
        self.iter()
            .filter(|(_, s)| !s.is_assessable())
            .map(|(d, _)| d)
            .collect()
    }

    /// Lowest scoring dimension; earliest in canonical order on ties.
    pub fn weakest_dimension(&self) -> QualityDimension {
        let mut weakest = QualityDimension::Structure;
        let mut lowest = f64::INFINITY;
        for (dimension, score) in self.iter() {
            if score.value() < lowest {
                lowest = score.value();
                weakest = dimension;
            }
        }
        weakest
    }

    /// Re-aggregate with a weight table. Reproduces `overall` for the table
    /// the profile was built with.
    pub fn recompute_overall(&self, weights: &WeightTable) -> f64 {
        weights.aggregate(|d| self.score(d))
    }
}
