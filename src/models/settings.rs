//! Engine Configuration
//!
//! `EngineConfig` is loaded once from TOML at startup, validated, and shared
//! as `Arc<EngineConfig>`. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! history_capacity = 50
//!
//! [selector]
//! direct_max_words = 1000
//!
//! [enhancement]
//! convergence_threshold = 0.1
//!
//! [[enhancement.strategies]]
//! id = "dialogue_enhancement"
//! targets = ["dialogue"]
//! weight = 0.9
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use story_forge_core::MAX_ENHANCEMENT_PASSES;
use story_forge_llm::RetryPolicy;
use story_forge_quality::{AssessmentConfig, DimensionTargets, WeightTable};

use crate::models::enhancement::{EnhancementStrategy, EnhancementStrategyKind};
use crate::models::strategy::GenerationStrategy;
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// Selector
// ============================================================================

fn default_direct_max_words() -> u32 {
    1000
}

fn default_complex_min_words() -> u32 {
    1500
}

fn default_iterative_complexity() -> f64 {
    0.8
}

fn default_standard_pass_allowance() -> u32 {
    2
}

fn default_strategy() -> GenerationStrategy {
    GenerationStrategy::OutlineFirst
}

/// Strategy selector thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Targets at or below this word count default to Direct
    #[serde(default = "default_direct_max_words")]
    pub direct_max_words: u32,
    /// Targets at or above this word count need an outline
    #[serde(default = "default_complex_min_words")]
    pub complex_min_words: u32,
    /// Complexity at which a targeted request becomes Iterative
    #[serde(default = "default_iterative_complexity")]
    pub iterative_complexity: f64,
    /// Pass cap for Direct and Outline-First plans
    #[serde(default = "default_standard_pass_allowance")]
    pub standard_pass_allowance: u32,
    /// Strategy for genres without a known profile
    #[serde(default = "default_strategy")]
    pub default_strategy: GenerationStrategy,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            direct_max_words: default_direct_max_words(),
            complex_min_words: default_complex_min_words(),
            iterative_complexity: default_iterative_complexity(),
            standard_pass_allowance: default_standard_pass_allowance(),
            default_strategy: default_strategy(),
        }
    }
}

// ============================================================================
// Enhancement
// ============================================================================

fn default_convergence_threshold() -> f64 {
    0.1
}

fn default_convergence_window() -> u32 {
    2
}

fn default_materiality_threshold() -> f64 {
    3.0
}

/// Enhancement loop and catalog settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementConfig {
    /// Overall-score gain at or below which a pass counts as stalled
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,
    /// Consecutive stalled passes that stop enhancement
    #[serde(default = "default_convergence_window")]
    pub convergence_window: u32,
    /// Smallest deficit that justifies a targeted strategy
    #[serde(default = "default_materiality_threshold")]
    pub materiality_threshold: f64,
    #[serde(default = "EnhancementStrategy::default_catalog")]
    pub strategies: Vec<EnhancementStrategy>,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            convergence_threshold: default_convergence_threshold(),
            convergence_window: default_convergence_window(),
            materiality_threshold: default_materiality_threshold(),
            strategies: EnhancementStrategy::default_catalog(),
        }
    }
}

// ============================================================================
// Timeouts
// ============================================================================

fn default_draft_seconds() -> u64 {
    120
}

fn default_enhancement_seconds() -> u64 {
    180
}

fn default_assessment_seconds() -> u64 {
    60
}

fn default_run_seconds() -> u64 {
    600
}

/// Per-call timeouts and the run time budget, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_draft_seconds")]
    pub draft_seconds: u64,
    #[serde(default = "default_enhancement_seconds")]
    pub enhancement_seconds: u64,
    #[serde(default = "default_assessment_seconds")]
    pub assessment_seconds: u64,
    #[serde(default = "default_run_seconds")]
    pub run_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            draft_seconds: default_draft_seconds(),
            enhancement_seconds: default_enhancement_seconds(),
            assessment_seconds: default_assessment_seconds(),
            run_seconds: default_run_seconds(),
        }
    }
}

impl TimeoutConfig {
    pub fn draft(&self) -> Duration {
        Duration::from_secs(self.draft_seconds)
    }

    pub fn enhancement(&self) -> Duration {
        Duration::from_secs(self.enhancement_seconds)
    }

    pub fn assessment(&self) -> Duration {
        Duration::from_secs(self.assessment_seconds)
    }

    pub fn run_budget(&self) -> Duration {
        Duration::from_secs(self.run_seconds)
    }
}

// ============================================================================
// Assessment
// ============================================================================

fn default_parallel() -> bool {
    true
}

/// Assessment pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSection {
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for AssessmentSection {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

// ============================================================================
// Engine Config
// ============================================================================

fn default_history_capacity() -> usize {
    50
}

fn default_telemetry_buffer() -> usize {
    256
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub weights: WeightTable,
    #[serde(default)]
    pub dimension_targets: DimensionTargets,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub enhancement: EnhancementConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub assessment: AssessmentSection,
    /// Completed runs kept for summaries and statistics
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Telemetry channel capacity
    #[serde(default = "default_telemetry_buffer")]
    pub telemetry_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            dimension_targets: DimensionTargets::default(),
            selector: SelectorConfig::default(),
            enhancement: EnhancementConfig::default(),
            retry: RetryPolicy::default(),
            timeouts: TimeoutConfig::default(),
            assessment: AssessmentSection::default(),
            history_capacity: default_history_capacity(),
            telemetry_buffer: default_telemetry_buffer(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> AppResult<Self> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        tracing::info!(path = %path.display(), "loading engine configuration");
        Self::from_toml_str(&raw)
    }

    /// Assessment pipeline settings derived from the timeouts and assessment
    /// sections.
    pub fn assessment_config(&self) -> AssessmentConfig {
        AssessmentConfig {
            dimension_timeout_secs: self.timeouts.assessment_seconds,
            parallel: self.assessment.parallel,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.weights.validate()?;
        self.dimension_targets.validate()?;

        let selector = &self.selector;
        if selector.direct_max_words > selector.complex_min_words {
            return Err(AppError::config(format!(
                "selector.direct_max_words ({}) must not exceed selector.complex_min_words ({})",
                selector.direct_max_words, selector.complex_min_words
            )));
        }
        if !(0.0..=1.0).contains(&selector.iterative_complexity) {
            return Err(AppError::config(
                "selector.iterative_complexity must be within [0, 1]",
            ));
        }
        if selector.standard_pass_allowance > MAX_ENHANCEMENT_PASSES {
            return Err(AppError::config(format!(
                "selector.standard_pass_allowance must be at most {}",
                MAX_ENHANCEMENT_PASSES
            )));
        }

        let enhancement = &self.enhancement;
        if !enhancement.convergence_threshold.is_finite() || enhancement.convergence_threshold < 0.0
        {
            return Err(AppError::config(
                "enhancement.convergence_threshold must be a non-negative number",
            ));
        }
        if enhancement.convergence_window == 0 {
            return Err(AppError::config(
                "enhancement.convergence_window must be at least 1",
            ));
        }
        if !enhancement.materiality_threshold.is_finite() || enhancement.materiality_threshold < 0.0
        {
            return Err(AppError::config(
                "enhancement.materiality_threshold must be a non-negative number",
            ));
        }
        let mut seen = HashSet::new();
        for strategy in &enhancement.strategies {
            if !seen.insert(strategy.kind) {
                return Err(AppError::config(format!(
                    "enhancement strategy '{}' is defined more than once",
                    strategy.id()
                )));
            }
            if !strategy.weight.is_finite() || strategy.weight < 0.0 {
                return Err(AppError::config(format!(
                    "enhancement strategy '{}' must have a non-negative weight",
                    strategy.id()
                )));
            }
            if strategy.targets.is_empty()
                && strategy.kind != EnhancementStrategyKind::Comprehensive
            {
                return Err(AppError::config(format!(
                    "enhancement strategy '{}' must target at least one dimension",
                    strategy.id()
                )));
            }
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(AppError::config(
                "retry.base_delay_ms must not exceed retry.max_delay_ms",
            ));
        }

        let t = &self.timeouts;
        if t.draft_seconds == 0
            || t.enhancement_seconds == 0
            || t.assessment_seconds == 0
            || t.run_seconds == 0
        {
            return Err(AppError::config("timeouts must be greater than zero"));
        }

        if self.history_capacity == 0 {
            return Err(AppError::config("history_capacity must be at least 1"));
        }
        if self.telemetry_buffer == 0 {
            return Err(AppError::config("telemetry_buffer must be at least 1"));
        }
        Ok(())
    }
}
