//! Enhancement Strategy Models
//!
//! The closed set of enhancement operations and the catalog entry describing
//! which dimensions each one targets and how strongly it is preferred.

use serde::{Deserialize, Serialize};
use story_forge_core::QualityDimension;

/// Enhancement operation identifier.
///
/// Variants are declared in identifier order so `Ord` matches the ordering
/// of `id()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnhancementStrategyKind {
    #[serde(rename = "character_enhancement")]
    Character,
    #[serde(rename = "coherence_enhancement")]
    Coherence,
    /// Light touch on every dimension; fallback when no deficit is material
    #[serde(rename = "comprehensive")]
    Comprehensive,
    #[serde(rename = "dialogue_enhancement")]
    Dialogue,
    #[serde(rename = "emotional_enhancement")]
    Emotional,
    #[serde(rename = "genre_enhancement")]
    Genre,
    #[serde(rename = "originality_enhancement")]
    Originality,
    #[serde(rename = "pacing_enhancement")]
    Pacing,
    #[serde(rename = "setting_enhancement")]
    Setting,
    #[serde(rename = "structure_enhancement")]
    Structure,
    #[serde(rename = "technical_enhancement")]
    Technical,
    #[serde(rename = "theme_enhancement")]
    Theme,
}

impl EnhancementStrategyKind {
    pub const ALL: [EnhancementStrategyKind; 12] = [
        EnhancementStrategyKind::Character,
        EnhancementStrategyKind::Coherence,
        EnhancementStrategyKind::Comprehensive,
        EnhancementStrategyKind::Dialogue,
        EnhancementStrategyKind::Emotional,
        EnhancementStrategyKind::Genre,
        EnhancementStrategyKind::Originality,
        EnhancementStrategyKind::Pacing,
        EnhancementStrategyKind::Setting,
        EnhancementStrategyKind::Structure,
        EnhancementStrategyKind::Technical,
        EnhancementStrategyKind::Theme,
    ];

    /// Stable identifier, identical to the serde representation.
    pub fn id(&self) -> &'static str {
        match self {
            EnhancementStrategyKind::Character => "character_enhancement",
            EnhancementStrategyKind::Coherence => "coherence_enhancement",
            EnhancementStrategyKind::Comprehensive => "comprehensive",
            EnhancementStrategyKind::Dialogue => "dialogue_enhancement",
            EnhancementStrategyKind::Emotional => "emotional_enhancement",
            EnhancementStrategyKind::Genre => "genre_enhancement",
            EnhancementStrategyKind::Originality => "originality_enhancement",
            EnhancementStrategyKind::Pacing => "pacing_enhancement",
            EnhancementStrategyKind::Setting => "setting_enhancement",
            EnhancementStrategyKind::Structure => "structure_enhancement",
            EnhancementStrategyKind::Technical => "technical_enhancement",
            EnhancementStrategyKind::Theme => "theme_enhancement",
        }
    }

    /// Dimensions targeted by the default catalog entry.
    pub fn default_targets(&self) -> Vec<QualityDimension> {
        use QualityDimension::*;
        match self {
            EnhancementStrategyKind::Character => vec![CharacterDevelopment],
            EnhancementStrategyKind::Coherence => vec![Coherence],
            EnhancementStrategyKind::Comprehensive => QualityDimension::ALL.to_vec(),
            EnhancementStrategyKind::Dialogue => vec![Dialogue],
            EnhancementStrategyKind::Emotional => vec![EmotionalImpact],
            EnhancementStrategyKind::Genre => vec![GenreCompliance],
            EnhancementStrategyKind::Originality => vec![Originality],
            EnhancementStrategyKind::Pacing => vec![Pacing],
            EnhancementStrategyKind::Setting => vec![SettingImmersion],
            EnhancementStrategyKind::Structure => vec![Structure],
            EnhancementStrategyKind::Technical => vec![TechnicalQuality],
            EnhancementStrategyKind::Theme => vec![ThemeIntegration],
        }
    }

    /// Weight used by the default catalog entry.
    pub fn default_weight(&self) -> f64 {
        match self {
            EnhancementStrategyKind::Character => 1.2,
            EnhancementStrategyKind::Comprehensive => 0.5,
            EnhancementStrategyKind::Dialogue => 0.9,
            EnhancementStrategyKind::Emotional => 1.3,
            EnhancementStrategyKind::Originality => 0.7,
            EnhancementStrategyKind::Pacing => 1.1,
            EnhancementStrategyKind::Setting => 0.8,
            EnhancementStrategyKind::Coherence
            | EnhancementStrategyKind::Genre
            | EnhancementStrategyKind::Structure
            | EnhancementStrategyKind::Technical
            | EnhancementStrategyKind::Theme => 1.0,
        }
    }
}

impl std::fmt::Display for EnhancementStrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Catalog entry: an enhancement operation, the dimensions it targets and
/// its preference weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementStrategy {
    #[serde(rename = "id")]
    pub kind: EnhancementStrategyKind,
    pub targets: Vec<QualityDimension>,
    pub weight: f64,
}

impl EnhancementStrategy {
    pub fn new(kind: EnhancementStrategyKind) -> Self {
        Self {
            kind,
            targets: kind.default_targets(),
            weight: kind.default_weight(),
        }
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    /// One entry per kind with default targets and weights.
    pub fn default_catalog() -> Vec<EnhancementStrategy> {
        EnhancementStrategyKind::ALL
            .iter()
            .map(|k| EnhancementStrategy::new(*k))
            .collect()
    }
}
