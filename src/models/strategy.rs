//! Generation Strategy Models
//!
//! The overall generation approach chosen once per request, the requirement
//! analysis it is based on, and the resulting plan.

use serde::{Deserialize, Serialize};

/// Generation approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// Single generation call
    Direct,
    /// Generate a structural outline, then expand it into the story
    OutlineFirst,
    /// Direct or outline-first generation with the full enhancement budget
    /// authorized up front
    Iterative,
}

impl GenerationStrategy {
    /// Human-readable label for the strategy.
    pub fn label(&self) -> &'static str {
        match self {
            GenerationStrategy::Direct => "Direct",
            GenerationStrategy::OutlineFirst => "Outline First",
            GenerationStrategy::Iterative => "Iterative",
        }
    }

    /// Return all available strategies.
    pub fn all() -> Vec<GenerationStrategy> {
        vec![
            GenerationStrategy::Direct,
            GenerationStrategy::OutlineFirst,
            GenerationStrategy::Iterative,
        ]
    }
}

impl std::fmt::Display for GenerationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStrategy::Direct => write!(f, "direct"),
            GenerationStrategy::OutlineFirst => write!(f, "outline_first"),
            GenerationStrategy::Iterative => write!(f, "iterative"),
        }
    }
}

/// Estimated difficulty of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn for_complexity(complexity: f64) -> Self {
        if complexity < 0.4 {
            Difficulty::Easy
        } else if complexity < 0.7 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }
}

/// Factors behind a request's complexity (each 0.0 - 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementAnalysis {
    /// Mean of the four factors below
    pub complexity: f64,
    pub word_count_factor: f64,
    pub genre_complexity: f64,
    pub theme_complexity: f64,
    pub setting_complexity: f64,
    /// How achievable the request looks (0.3 - 1.0)
    pub feasibility: f64,
    pub difficulty: Difficulty,
}

/// The selector's output for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPlan {
    pub strategy: GenerationStrategy,
    /// Whether an outline sub-step runs before the story draft
    pub use_outline: bool,
    /// Enhancement passes authorized for this run. Below the request's
    /// maximum for non-iterative plans.
    pub pass_budget: u32,
    pub reasoning: String,
    pub analysis: RequirementAnalysis,
}
