//! Enhancement Catalog Integration Tests
//!
//! Catalog construction from engine configuration, weighted-deficit
//! selection against realistic profiles, and revision change descriptions.

use std::sync::Arc;

use story_forge::models::{EngineConfig, EnhancementStrategyKind};
use story_forge::services::enhancement::describe_changes;
use story_forge::services::EnhancementCatalog;
use story_forge::WorkflowEngine;
use story_forge_core::{GenerationRequestBuilder, Genre, QualityDimension};
use story_forge_quality::{DimensionScore, QualityProfile, WeightTable};

use crate::support::{ScriptedAssessor, ScriptedBackend};

fn default_catalog() -> EnhancementCatalog {
    let config = EngineConfig::default();
    EnhancementCatalog::from_config(&config.enhancement, config.dimension_targets.clone()).unwrap()
}

/// Every dimension at `base` except the listed overrides.
fn profile(base: f64, overrides: &[(QualityDimension, f64)]) -> QualityProfile {
    QualityProfile::from_values(
        QualityDimension::ALL.iter().map(|d| {
            let value = overrides
                .iter()
                .find(|(o, _)| o == d)
                .map(|(_, v)| *v)
                .unwrap_or(base);
            (*d, value)
        }),
        &WeightTable::default(),
    )
    .unwrap()
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_weakest_heavily_weighted_dimension_wins() {
    let catalog = default_catalog();
    let selected = catalog.select_best(&profile(
        8.0,
        &[
            (QualityDimension::Dialogue, 4.0),
            (QualityDimension::Pacing, 5.0),
        ],
    ));
    // pacing 1.1 * 5.0 = 5.5 edges out dialogue 0.9 * 6.0 = 5.4
    assert_eq!(selected.kind, EnhancementStrategyKind::Pacing);
}

#[test]
fn test_single_material_deficit_is_targeted() {
    let catalog = default_catalog();
    let selected = catalog.select_best(&profile(9.0, &[(QualityDimension::SettingImmersion, 3.0)]));
    assert_eq!(selected.kind, EnhancementStrategyKind::Setting);
    assert_eq!(selected.targets, vec![QualityDimension::SettingImmersion]);
}

#[test]
fn test_small_deficits_fall_back_to_comprehensive() {
    let catalog = default_catalog();
    let selected = catalog.select_best(&profile(7.5, &[(QualityDimension::Originality, 7.1)]));
    assert_eq!(selected.kind, EnhancementStrategyKind::Comprehensive);
}

#[test]
fn test_unscored_profile_targets_heaviest_entry() {
    let catalog = default_catalog();
    let unscored = QualityProfile::unassessable("backend offline", &WeightTable::default());
    assert_eq!(
        catalog.select_best(&unscored).kind,
        EnhancementStrategyKind::Emotional
    );
}

#[test]
fn test_all_zero_profile_is_not_comprehensive() {
    let catalog = default_catalog();
    let zero = QualityProfile::uniform(0.0, &WeightTable::default()).unwrap();
    assert_eq!(
        catalog.select_best(&zero).kind,
        EnhancementStrategyKind::Emotional
    );
}

#[test]
fn test_unassessable_dimension_counts_as_full_deficit() {
    let catalog = default_catalog();
    let scores = QualityDimension::ALL
        .iter()
        .map(|d| {
            let score = if *d == QualityDimension::Coherence {
                DimensionScore::unassessable("timed out")
            } else {
                DimensionScore::scored(9.0)
            };
            (*d, score)
        })
        .collect();
    let profile = QualityProfile::from_scores(scores, &WeightTable::default()).unwrap();
    assert_eq!(
        catalog.select_best(&profile).kind,
        EnhancementStrategyKind::Coherence
    );
}

#[test]
fn test_configured_catalog_changes_preference() {
    let raw = r#"
        [enhancement]
        materiality_threshold = 1.0

        [[enhancement.strategies]]
        id = "technical_enhancement"
        targets = ["technical_quality", "coherence"]
        weight = 3.0

        [[enhancement.strategies]]
        id = "emotional_enhancement"
        targets = ["emotional_impact"]
        weight = 1.0
    "#;
    let config = EngineConfig::from_toml_str(raw).unwrap();
    let catalog =
        EnhancementCatalog::from_config(&config.enhancement, config.dimension_targets.clone())
            .unwrap();

    // Two configured entries plus the implicit comprehensive fallback
    assert_eq!(catalog.len(), 3);
    let selected = catalog.select_best(&profile(
        8.0,
        &[
            (QualityDimension::EmotionalImpact, 5.0),
            (QualityDimension::TechnicalQuality, 7.0),
        ],
    ));
    // technical 3.0 * (3.0 + 2.0) = 15.0, emotional 1.0 * 5.0 = 5.0
    assert_eq!(selected.kind, EnhancementStrategyKind::Technical);
}

#[test]
fn test_dimension_targets_lower_the_ceiling() {
    let raw = r#"
        [dimension_targets]
        dialogue = 6.0
    "#;
    let config = EngineConfig::from_toml_str(raw).unwrap();
    let catalog =
        EnhancementCatalog::from_config(&config.enhancement, config.dimension_targets.clone())
            .unwrap();

    // Dialogue already meets its own target; pacing is the real gap
    let selected = catalog.select_best(&profile(
        9.0,
        &[
            (QualityDimension::Dialogue, 4.0),
            (QualityDimension::Pacing, 5.5),
        ],
    ));
    assert_eq!(selected.kind, EnhancementStrategyKind::Pacing);
}

#[test]
fn test_engine_rejects_duplicate_strategies() {
    let mut config = EngineConfig::default();
    let duplicate = config.enhancement.strategies[0].clone();
    config.enhancement.strategies.push(duplicate);

    let result = WorkflowEngine::new(
        Arc::new(config),
        Arc::new(ScriptedBackend::new()),
        Arc::new(ScriptedAssessor::new(&[7.0])),
    );
    assert!(result.is_err());
}

// ============================================================================
// Change Descriptions
// ============================================================================

#[test]
fn test_dialogue_changes_count_new_lines() {
    let before = "She waited.\n\nThe door opened.";
    let after = "She waited.\n\n\"You're late,\" she said.\n\"Traffic,\" he lied.\n\nThe door opened.";
    let changes = describe_changes(EnhancementStrategyKind::Dialogue, before, after);
    assert_eq!(changes[0], "Added 2 lines of dialogue");
    assert!(changes.contains(&"Preserved story length".to_string()));
}

#[test]
fn test_large_length_change_is_not_reported_as_maintained() {
    let before = "word ".repeat(200);
    let after = "word ".repeat(100);
    let changes = describe_changes(EnhancementStrategyKind::Pacing, &before, &after);
    assert_eq!(changes, vec!["Tightened pacing, trimming 100 words".to_string()]);
}

#[tokio::test]
async fn test_changes_are_recorded_on_passes() {
    let request = GenerationRequestBuilder::new(Genre::Mystery, 2000)
        .quality_target(9.0)
        .max_enhancement_passes(1)
        .build()
        .unwrap();
    let engine = WorkflowEngine::new(
        Arc::new(EngineConfig::default()),
        Arc::new(ScriptedBackend::new()),
        Arc::new(ScriptedAssessor::new(&[6.0, 6.8])),
    )
    .unwrap();

    let run = engine.execute_workflow(request).await;

    assert_eq!(run.pass_count(), 1);
    assert!(!run.passes()[0].changes.is_empty());
}
