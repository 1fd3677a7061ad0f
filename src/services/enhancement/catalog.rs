//! Enhancement Strategy Catalog
//!
//! Read-only catalog loaded once from configuration and shared by all runs.
//! Selection ranks entries by weighted deficit over their targeted
//! dimensions.
//!
//! ## Selection
//! - Deficit per dimension: `max(target - score, 0)`, target defaulting to 10
//! - Score per entry: `weight * sum(deficit of each targeted dimension)`
//! - Highest score wins; ties go to the lowest identifier
//! - Unassessable dimensions count as a full deficit
//! - When no single deficit exceeds the materiality threshold the
//!   comprehensive entry is returned

use std::collections::BTreeMap;

use story_forge_core::{CoreError, CoreResult, QualityDimension};
use story_forge_quality::{DimensionTargets, QualityProfile};

use crate::models::enhancement::{EnhancementStrategy, EnhancementStrategyKind};
use crate::models::settings::EnhancementConfig;

/// Immutable catalog of enhancement strategies.
#[derive(Debug, Clone)]
pub struct EnhancementCatalog {
    /// Keyed by kind, so iteration follows identifier order
    entries: BTreeMap<EnhancementStrategyKind, EnhancementStrategy>,
    targets: DimensionTargets,
    materiality_threshold: f64,
}

impl EnhancementCatalog {
    /// Build from validated configuration. A missing comprehensive entry is
    /// filled with its default.
    pub fn from_config(config: &EnhancementConfig, targets: DimensionTargets) -> CoreResult<Self> {
        let mut entries = BTreeMap::new();
        for strategy in &config.strategies {
            if entries.insert(strategy.kind, strategy.clone()).is_some() {
                return Err(CoreError::config(format!(
                    "duplicate enhancement strategy '{}'",
                    strategy.kind
                )));
            }
        }
        entries
            .entry(EnhancementStrategyKind::Comprehensive)
            .or_insert_with(|| EnhancementStrategy::new(EnhancementStrategyKind::Comprehensive));

        Ok(Self {
            entries,
            targets,
            materiality_threshold: config.materiality_threshold,
        })
    }

    pub fn get(&self, kind: EnhancementStrategyKind) -> Option<&EnhancementStrategy> {
        self.entries.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnhancementStrategy> {
        self.entries.values()
    }

    pub fn targets(&self) -> &DimensionTargets {
        &self.targets
    }

    fn comprehensive(&self) -> EnhancementStrategy {
        self.entries
            .get(&EnhancementStrategyKind::Comprehensive)
            .cloned()
            .unwrap_or_else(|| EnhancementStrategy::new(EnhancementStrategyKind::Comprehensive))
    }

    /// Weighted deficit of one entry against a profile.
    pub fn weighted_deficit(&self, strategy: &EnhancementStrategy, profile: &QualityProfile) -> f64 {
        let deficit: f64 = strategy
            .targets
            .iter()
            .map(|d| self.targets.deficit(profile, *d))
            .sum();
        strategy.weight * deficit
    }

    /// Pick the best-fit strategy for the current profile.
    pub fn select_best(&self, profile: &QualityProfile) -> EnhancementStrategy {
        let max_deficit = QualityDimension::ALL
            .iter()
            .map(|d| self.targets.deficit(profile, *d))
            .fold(0.0_f64, f64::max);

        if max_deficit <= self.materiality_threshold {
            return self.comprehensive();
        }

        let mut best: Option<(&EnhancementStrategy, f64)> = None;
        for strategy in self.entries.values() {
            if strategy.kind == EnhancementStrategyKind::Comprehensive {
                continue;
            }
            let score = self.weighted_deficit(strategy, profile);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((strategy, score)),
            }
        }

        match best {
            Some((strategy, score)) if score > 0.0 => strategy.clone(),
            _ => self.comprehensive(),
        }
    }
}
