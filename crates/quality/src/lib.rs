//! Story Forge Quality
//!
//! Quality profile model, weighted aggregation and the concurrent assessment
//! pipeline:
//!
//! - `models` - Profile types (DimensionScore, QualityProfile, WeightTable, DimensionTargets)
//! - `pipeline` - Assessor contracts and the concurrent AssessmentPipeline
//! - `feedback` - Tier, strengths and improvement areas derived from a profile
//!
//! The backend-driven dimension assessor lives in the main crate's
//! `services::assessment` module.

pub mod feedback;
pub mod models;
pub mod pipeline;

// Re-export model types
pub use models::{
    round2, AssessmentError, DimensionScore, DimensionTargets, QualityProfile, WeightTable,
    UNASSESSABLE_SCORE,
};

// Re-export pipeline types
pub use pipeline::{AssessmentConfig, AssessmentPipeline, DimensionAssessor, QualityAssessor};

// Re-export feedback
pub use feedback::{ImprovementArea, QualityFeedback, QualityTier};
