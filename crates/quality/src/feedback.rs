//! Quality Feedback
//!
//! Reader-facing summary of a profile: tier, strengths and prioritized
//! improvement areas.

use serde::{Deserialize, Serialize};
use story_forge_core::QualityDimension;

use crate::models::QualityProfile;

/// Dimensions at or above this score are strengths.
pub const STRENGTH_THRESHOLD: f64 = 8.0;

/// Dimensions below this score are improvement areas.
pub const IMPROVEMENT_THRESHOLD: f64 = 7.0;

/// Overall quality band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Excellent,
    Good,
    Acceptable,
    NeedsWork,
}

impl QualityTier {
    pub fn for_score(overall: f64) -> Self {
        if overall >= 9.0 {
            QualityTier::Excellent
        } else if overall >= 8.0 {
            QualityTier::Good
        } else if overall >= 7.0 {
            QualityTier::Acceptable
        } else {
            QualityTier::NeedsWork
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTier::Excellent => write!(f, "excellent"),
            QualityTier::Good => write!(f, "good"),
            QualityTier::Acceptable => write!(f, "acceptable"),
            QualityTier::NeedsWork => write!(f, "needs_work"),
        }
    }
}

/// A dimension worth working on. Priority 1 is the most urgent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementArea {
    pub dimension: QualityDimension,
    pub score: f64,
    pub priority: u8,
    pub suggestion: String,
}

fn priority_for(score: f64) -> u8 {
    if score < 5.0 {
        1
    } else if score < 6.5 {
        2
    } else if score < 7.5 {
        3
    } else if score < 8.5 {
        4
    } else {
        5
    }
}

/// Feedback derived from a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityFeedback {
    pub tier: QualityTier,
    pub overall: f64,
    pub strengths: Vec<QualityDimension>,
    pub improvement_areas: Vec<ImprovementArea>,
    pub unassessable: Vec<QualityDimension>,
}

impl QualityFeedback {
    pub fn from_profile(profile: &QualityProfile) -> Self {
        let strengths = profile
            .iter()
            .filter(|(_, s)| s.is_assessable() && s.value() >= STRENGTH_THRESHOLD)
            .map(|(d, _)| d)
            .collect();

        let mut improvement_areas: Vec<ImprovementArea> = profile
            .iter()
            .filter(|(_, s)| s.value() < IMPROVEMENT_THRESHOLD)
            .map(|(dimension, s)| ImprovementArea {
                dimension,
                score: s.value(),
                priority: priority_for(s.value()),
                suggestion: format!("Strengthen {}: {}", dimension.label(), dimension.rubric()),
            })
            .collect();
        // stable: canonical order within a priority
        improvement_areas.sort_by_key(|a| a.priority);

        Self {
            tier: QualityTier::for_score(profile.overall()),
            overall: profile.overall(),
            strengths,
            improvement_areas,
            unassessable: profile.unassessable_dimensions(),
        }
    }
}
