//! Strategy Selector
//!
//! Chooses the generation approach for a request. Selection is a pure
//! function of the request and the selector thresholds loaded at startup:
//! identical requests always produce identical plans.
//!
//! ## Policy (first match wins)
//! 1. No quality target and a short target length: **Direct**
//! 2. Quality target with a long target or a hard request: **Iterative**
//! 3. Quality target or a long target: **Outline-First**
//! 4. Otherwise by genre: plot-driven genres get an outline, unknown genres
//!    use the configured default, the rest go Direct

use story_forge_core::{GenerationRequest, Genre};

use crate::models::settings::SelectorConfig;
use crate::models::strategy::{GenerationStrategy, RequirementAnalysis, StrategyPlan};
use crate::services::strategy::analyzer::RequirementAnalyzer;

/// Read-only strategy selector, shared by all runs.
#[derive(Debug, Clone, Default)]
pub struct StrategySelector {
    config: SelectorConfig,
}

impl StrategySelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Requirement analysis behind a selection.
    pub fn analyze(&self, request: &GenerationRequest) -> RequirementAnalysis {
        RequirementAnalyzer::analyze(request)
    }

    /// Choose a strategy and pass budget for the request. Never fails.
    ///
    /// Direct and outline-first plans are held to `standard_pass_allowance`
    /// even when the request allows more passes; the plan's reasoning notes
    /// the cap when it applies.
    pub fn select(&self, request: &GenerationRequest) -> StrategyPlan {
        let analysis = self.analyze(request);
        let words = request.target_word_count;
        let targeted = request.has_quality_target();
        let long = words >= self.config.complex_min_words;

        let (strategy, mut reasoning) = if !targeted && words <= self.config.direct_max_words {
            (
                GenerationStrategy::Direct,
                format!(
                    "Short target ({} words) without a quality target suits a single generation call",
                    words
                ),
            )
        } else if targeted && (long || analysis.complexity >= self.config.iterative_complexity) {
            (
                GenerationStrategy::Iterative,
                format!(
                    "Quality target with a {} request (complexity {:.2}) warrants the full enhancement budget",
                    if long { "long" } else { "hard" },
                    analysis.complexity
                ),
            )
        } else if targeted || long {
            (
                GenerationStrategy::OutlineFirst,
                if targeted {
                    "Quality target benefits from an outline before drafting".to_string()
                } else {
                    format!("Long target ({} words) benefits from an outline", words)
                },
            )
        } else {
            self.select_by_genre(&request.genre)
        };

        let use_outline = match strategy {
            GenerationStrategy::Direct => false,
            GenerationStrategy::OutlineFirst => true,
            GenerationStrategy::Iterative => words > self.config.direct_max_words,
        };

        // Only iterative plans may spend the full requested pass count
        let pass_budget = match strategy {
            GenerationStrategy::Iterative => request.max_enhancement_passes,
            _ => request
                .max_enhancement_passes
                .min(self.config.standard_pass_allowance),
        };
        if pass_budget < request.max_enhancement_passes {
            reasoning.push_str(&format!(
                "; pass budget capped at {} of {} requested",
                pass_budget, request.max_enhancement_passes
            ));
        }

        StrategyPlan {
            strategy,
            use_outline,
            pass_budget,
            reasoning,
            analysis,
        }
    }

    fn select_by_genre(&self, genre: &Genre) -> (GenerationStrategy, String) {
        match genre {
            Genre::Mystery | Genre::Literary => (
                GenerationStrategy::OutlineFirst,
                format!("{} stories depend on planned structure", genre),
            ),
            Genre::Other(label) => (
                self.config.default_strategy,
                format!(
                    "No profile for genre '{}'; using default strategy {}",
                    label, self.config.default_strategy
                ),
            ),
            _ => (
                GenerationStrategy::Direct,
                format!("Mid-length {} request suits a single generation call", genre),
            ),
        }
    }
}
