//! Generation Request Model
//!
//! The immutable input to a workflow run: genre, length class, target word
//! count, optional theme/setting, an optional quality target and the
//! enhancement pass budget.
//!
//! ## Validation
//!
//! - target word count must be greater than zero
//! - a quality target, when set, must be finite and lie in `[0, 10]`
//! - max enhancement passes must not exceed [`MAX_ENHANCEMENT_PASSES`]

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Hard upper bound on enhancement passes per run.
pub const MAX_ENHANCEMENT_PASSES: u32 = 10;

/// Default enhancement pass budget.
pub const DEFAULT_ENHANCEMENT_PASSES: u32 = 3;

/// Upper bound of the flash fiction length class, in words.
pub const FLASH_MAX_WORDS: u32 = 1000;

/// Scale ceiling for quality scores.
pub const MAX_QUALITY_SCORE: f64 = 10.0;

// ============================================================================
// Genre
// ============================================================================

/// Story genre.
///
/// Unknown labels are preserved in `Other` so that downstream selection can
/// fall back to a default instead of rejecting the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Literary,
    Mystery,
    ScienceFiction,
    Fantasy,
    Romance,
    Other(String),
}

impl Genre {
    /// Parse a genre label, accepting common aliases. Never fails.
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "literary" | "literary_fiction" | "drama" | "fiction" | "contemporary" => {
                Genre::Literary
            }
            "mystery" | "detective" | "crime" | "thriller" | "whodunit" => Genre::Mystery,
            "science_fiction" | "sci_fi" | "scifi" | "sf" | "science" => Genre::ScienceFiction,
            "fantasy" | "magical" | "epic" | "urban_fantasy" => Genre::Fantasy,
            "romance" | "love" | "romantic" => Genre::Romance,
            _ => Genre::Other(label.trim().to_string()),
        }
    }

    /// Stable identifier for logs and reports.
    pub fn as_str(&self) -> &str {
        match self {
            Genre::Literary => "literary",
            Genre::Mystery => "mystery",
            Genre::ScienceFiction => "science_fiction",
            Genre::Fantasy => "fantasy",
            Genre::Romance => "romance",
            Genre::Other(label) => label.as_str(),
        }
    }

    /// Whether this genre has a known generation profile.
    pub fn is_known(&self) -> bool {
        !matches!(self, Genre::Other(_))
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Genre {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Genre::parse(s))
    }
}

// ============================================================================
// Length class
// ============================================================================

/// Target length class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthClass {
    /// Flash fiction, up to 1000 words
    Flash,
    /// Short story, above 1000 words
    Short,
}

impl LengthClass {
    /// Derive the class from a word count.
    pub fn for_word_count(words: u32) -> Self {
        if words <= FLASH_MAX_WORDS {
            LengthClass::Flash
        } else {
            LengthClass::Short
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthClass::Flash => "flash",
            LengthClass::Short => "short",
        }
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "flash" | "flash_fiction" => Ok(LengthClass::Flash),
            "short" | "short_story" => Ok(LengthClass::Short),
            other => Err(CoreError::parse(format!("Unknown length class: '{}'", other))),
        }
    }
}

impl std::fmt::Display for LengthClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Request
// ============================================================================

fn default_max_passes() -> u32 {
    DEFAULT_ENHANCEMENT_PASSES
}

/// A story generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub genre: Genre,
    pub length: LengthClass,
    pub target_word_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    /// Overall score to reach; `None` disables enhancement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_target: Option<f64>,
    #[serde(default = "default_max_passes")]
    pub max_enhancement_passes: u32,
    /// Fail the run on a late backend failure instead of returning the
    /// best draft as degraded.
    #[serde(default)]
    pub strict_success: bool,
}

impl GenerationRequest {
    /// Create a request with defaults for the optional fields.
    pub fn new(genre: Genre, target_word_count: u32) -> Self {
        Self {
            genre,
            length: LengthClass::for_word_count(target_word_count),
            target_word_count,
            theme: None,
            setting: None,
            quality_target: None,
            max_enhancement_passes: DEFAULT_ENHANCEMENT_PASSES,
            strict_success: false,
        }
    }

    /// Check field ranges.
    pub fn validate(&self) -> CoreResult<()> {
        if self.target_word_count == 0 {
            return Err(CoreError::validation(
                "target word count must be greater than zero",
            ));
        }
        if let Some(target) = self.quality_target {
            if !target.is_finite() || !(0.0..=MAX_QUALITY_SCORE).contains(&target) {
                return Err(CoreError::validation(format!(
                    "quality target must be within [0, 10], got {}",
                    target
                )));
            }
        }
        if self.max_enhancement_passes > MAX_ENHANCEMENT_PASSES {
            return Err(CoreError::validation(format!(
                "max enhancement passes must be at most {}, got {}",
                MAX_ENHANCEMENT_PASSES, self.max_enhancement_passes
            )));
        }
        Ok(())
    }

    /// Whether enhancement is enabled at all.
    pub fn has_quality_target(&self) -> bool {
        self.quality_target.is_some()
    }

    pub fn theme_or_default(&self) -> &str {
        self.theme.as_deref().unwrap_or("an open theme of the writer's choosing")
    }

    pub fn setting_or_default(&self) -> &str {
        self.setting.as_deref().unwrap_or("a setting suited to the genre")
    }
}
