//! Quality Dimensions
//!
//! The fixed, ordered set of independently scored quality axes. The
//! declaration order is the canonical order used by profiles, weight tables
//! and reports.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// One independently scored axis of story quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityDimension {
    /// Narrative arc: opening, rising action, climax, resolution
    Structure,
    /// Logical consistency and flow between events
    Coherence,
    /// Adherence to the conventions of the requested genre
    GenreCompliance,
    /// Character depth, motivation and growth
    CharacterDevelopment,
    /// Rhythm and tension management
    Pacing,
    /// How naturally the requested theme is woven in
    ThemeIntegration,
    /// Naturalness and purpose of dialogue
    Dialogue,
    /// Setting description and atmosphere
    SettingImmersion,
    /// Emotional resonance and reader engagement
    EmotionalImpact,
    /// Freshness of ideas and execution
    Originality,
    /// Prose, grammar and style
    TechnicalQuality,
}

impl QualityDimension {
    /// Every dimension, in canonical order.
    pub const ALL: [QualityDimension; 11] = [
        QualityDimension::Structure,
        QualityDimension::Coherence,
        QualityDimension::GenreCompliance,
        QualityDimension::CharacterDevelopment,
        QualityDimension::Pacing,
        QualityDimension::ThemeIntegration,
        QualityDimension::Dialogue,
        QualityDimension::SettingImmersion,
        QualityDimension::EmotionalImpact,
        QualityDimension::Originality,
        QualityDimension::TechnicalQuality,
    ];

    /// Number of dimensions in a complete profile.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable snake_case key, identical to the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            QualityDimension::Structure => "structure",
            QualityDimension::Coherence => "coherence",
            QualityDimension::GenreCompliance => "genre_compliance",
            QualityDimension::CharacterDevelopment => "character_development",
            QualityDimension::Pacing => "pacing",
            QualityDimension::ThemeIntegration => "theme_integration",
            QualityDimension::Dialogue => "dialogue",
            QualityDimension::SettingImmersion => "setting_immersion",
            QualityDimension::EmotionalImpact => "emotional_impact",
            QualityDimension::Originality => "originality",
            QualityDimension::TechnicalQuality => "technical_quality",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            QualityDimension::Structure => "Structure",
            QualityDimension::Coherence => "Coherence",
            QualityDimension::GenreCompliance => "Genre Compliance",
            QualityDimension::CharacterDevelopment => "Character Development",
            QualityDimension::Pacing => "Pacing",
            QualityDimension::ThemeIntegration => "Theme Integration",
            QualityDimension::Dialogue => "Dialogue",
            QualityDimension::SettingImmersion => "Setting Immersion",
            QualityDimension::EmotionalImpact => "Emotional Impact",
            QualityDimension::Originality => "Originality",
            QualityDimension::TechnicalQuality => "Technical Quality",
        }
    }

    /// One-line rubric handed to scorers and revisers.
    pub fn rubric(&self) -> &'static str {
        match self {
            QualityDimension::Structure => {
                "clear beginning, middle and end with a satisfying arc and resolution"
            }
            QualityDimension::Coherence => {
                "events follow logically, no plot holes, characters act consistently"
            }
            QualityDimension::GenreCompliance => {
                "meets reader expectations and conventions of the genre"
            }
            QualityDimension::CharacterDevelopment => {
                "characters have motivation, depth, distinct voices and change"
            }
            QualityDimension::Pacing => "tension builds and releases, scenes are well proportioned",
            QualityDimension::ThemeIntegration => {
                "the theme emerges naturally from events rather than being stated"
            }
            QualityDimension::Dialogue => {
                "dialogue sounds natural, reveals character and advances the plot"
            }
            QualityDimension::SettingImmersion => {
                "setting is vivid, sensory and supports mood and genre"
            }
            QualityDimension::EmotionalImpact => {
                "the reader feels the stakes; moments of genuine emotional connection"
            }
            QualityDimension::Originality => "fresh ideas or a fresh take on familiar material",
            QualityDimension::TechnicalQuality => {
                "clean prose, varied sentences, precise word choice, no errors"
            }
        }
    }

    /// Parse a dimension from its key (also accepts spaces and hyphens).
    pub fn parse(value: &str) -> CoreResult<Self> {
        let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.key() == normalized)
            .ok_or_else(|| CoreError::parse(format!("Unknown quality dimension: '{}'", value)))
    }
}

impl std::fmt::Display for QualityDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for QualityDimension {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
