//! Requirement Analyzer
//!
//! Scores a generation request's complexity from four factors so the
//! selector can decide how much structure and refinement a request needs.
//!
//! ## Factors
//! - **Word count**: banded by target length
//! - **Genre**: fixed per-genre complexity; unknown genres use a middle value
//! - **Theme**: specificity of the requested theme (word count of the phrase)
//! - **Setting**: specificity of the requested setting
//!
//! The overall complexity is the mean of the four factors. Analysis is pure
//! and deterministic.

use story_forge_core::{GenerationRequest, Genre};
use story_forge_quality::round2;

use crate::models::strategy::{Difficulty, RequirementAnalysis};

/// Word-count bands: (upper bound inclusive, factor).
const WORD_COUNT_BANDS: &[(u32, f64)] = &[
    (500, 0.2),
    (1000, 0.4),
    (1500, 0.6),
    (3000, 0.8),
    (5000, 0.9),
];

const MIN_FEASIBILITY: f64 = 0.3;
const MAX_FEASIBILITY: f64 = 1.0;

/// Stateless requirement analyzer.
pub struct RequirementAnalyzer;

impl RequirementAnalyzer {
    /// Analyze a request's complexity and feasibility.
    pub fn analyze(request: &GenerationRequest) -> RequirementAnalysis {
        let word_count_factor = Self::word_count_factor(request.target_word_count);
        let genre_complexity = Self::genre_complexity(&request.genre);
        let theme_complexity = Self::phrase_complexity(request.theme.as_deref(), &[1, 3]);
        let setting_complexity = Self::phrase_complexity(request.setting.as_deref(), &[2, 5]);

        let complexity = round2(
            (word_count_factor + genre_complexity + theme_complexity + setting_complexity) / 4.0,
        );

        RequirementAnalysis {
            complexity,
            word_count_factor,
            genre_complexity,
            theme_complexity,
            setting_complexity,
            feasibility: Self::feasibility(complexity, request.target_word_count),
            difficulty: Difficulty::for_complexity(complexity),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn word_count_factor(words: u32) -> f64 {
        WORD_COUNT_BANDS
            .iter()
            .find(|(limit, _)| words <= *limit)
            .map(|(_, factor)| *factor)
            .unwrap_or(1.0)
    }

    fn genre_complexity(genre: &Genre) -> f64 {
        match genre {
            Genre::Literary => 0.8,
            Genre::Mystery => 0.7,
            Genre::ScienceFiction => 0.9,
            Genre::Fantasy => 0.9,
            Genre::Romance => 0.6,
            Genre::Other(_) => 0.7,
        }
    }

    /// 0.1 when absent, then 0.3 / 0.5 / 0.7 as the phrase grows past each
    /// word-count band.
    fn phrase_complexity(phrase: Option<&str>, bands: &[usize; 2]) -> f64 {
        let words = phrase.map(|p| p.split_whitespace().count()).unwrap_or(0);
        if words == 0 {
            0.1
        } else if words <= bands[0] {
            0.3
        } else if words <= bands[1] {
            0.5
        } else {
            0.7
        }
    }

    fn feasibility(complexity: f64, words: u32) -> f64 {
        let length_penalty = if words > 7000 {
            0.1
        } else if words < 100 {
            0.2
        } else {
            0.0
        };
        round2((0.9 - complexity * 0.2 - length_penalty).clamp(MIN_FEASIBILITY, MAX_FEASIBILITY))
    }
}
