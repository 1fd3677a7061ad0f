//! Enhancement Application
//!
//! Applies a catalog strategy by asking the text backend to revise the
//! artifact. Each strategy kind maps to an entry in a fixed table holding
//! its revision focus and the function that describes what changed.
//!
//! The backend is prompted to revise, not regenerate. Whether untargeted
//! dimensions survived is checked by the next assessment, not here.

use std::sync::Arc;
use std::time::Duration;

use story_forge_core::GenerationRequest;
use story_forge_llm::{
    call_with_retry, BackendResult, CancellationToken, RetryPolicy, RevisionHint, TextBackend,
};
use story_forge_quality::QualityProfile;
use tracing::debug;

use crate::models::enhancement::{EnhancementStrategy, EnhancementStrategyKind};

/// Word-count drift under which the revision counts as length-preserving.
const LENGTH_TOLERANCE_WORDS: usize = 50;

// ============================================================================
// Apply Table
// ============================================================================

/// Measurements of an artifact used to describe a revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    pub words: usize,
    pub paragraphs: usize,
    pub dialogue_lines: usize,
}

impl TextStats {
    pub fn measure(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            paragraphs: text
                .split("\n\n")
                .filter(|p| !p.trim().is_empty())
                .count(),
            dialogue_lines: text
                .lines()
                .filter(|l| l.contains('"') || l.contains('\u{201C}'))
                .count(),
        }
    }
}

type DescribeFn = fn(&TextStats, &TextStats) -> Vec<String>;

struct ApplySpec {
    kind: EnhancementStrategyKind,
    focus: &'static str,
    describe: DescribeFn,
}

const APPLY_TABLE: &[ApplySpec] = &[
    ApplySpec {
        kind: EnhancementStrategyKind::Character,
        focus: "Deepen the characters: sharpen motivations, give the protagonist a clear arc, and show interiority through action and choice.",
        describe: |_, _| vec!["Deepened character motivation and arc".to_string()],
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Coherence,
        focus: "Improve coherence: fix logical gaps, smooth transitions between scenes, and keep cause and effect clear.",
        describe: |_, _| vec!["Smoothed transitions and closed logical gaps".to_string()],
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Comprehensive,
        focus: "Polish the whole story lightly: tighten prose, clarify weak passages, and strengthen the ending without restructuring.",
        describe: |_, _| vec!["Applied a light polish across the whole story".to_string()],
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Dialogue,
        focus: "Improve the dialogue: make each voice distinct, cut exposition from speech, and add subtext.",
        describe: describe_dialogue,
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Emotional,
        focus: "Raise the emotional impact: ground feelings in concrete detail, build tension toward the climax, and land the resolution.",
        describe: |_, _| vec!["Strengthened emotional beats and climax".to_string()],
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Genre,
        focus: "Strengthen genre conventions: honour the reader expectations of the genre while keeping the story fresh.",
        describe: |_, _| vec!["Reinforced genre conventions".to_string()],
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Originality,
        focus: "Increase originality: replace clichés and predictable turns with specific, surprising choices.",
        describe: |_, _| vec!["Replaced predictable elements with fresher choices".to_string()],
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Pacing,
        focus: "Fix the pacing: compress slow stretches, give key moments room, and vary sentence rhythm.",
        describe: describe_pacing,
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Setting,
        focus: "Deepen setting immersion: add sensory detail and let the place shape events and mood.",
        describe: |_, _| vec!["Added sensory setting detail".to_string()],
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Structure,
        focus: "Improve structure: make the beginning, middle and end distinct and ensure each scene advances the plot.",
        describe: describe_structure,
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Technical,
        focus: "Improve technical quality: fix grammar, awkward phrasing, repetition and inconsistent tense.",
        describe: |_, _| vec!["Corrected grammar and phrasing".to_string()],
    },
    ApplySpec {
        kind: EnhancementStrategyKind::Theme,
        focus: "Integrate the theme: weave it through imagery, choices and the resolution without stating it outright.",
        describe: |_, _| vec!["Wove the theme through imagery and resolution".to_string()],
    },
];

fn lookup(kind: EnhancementStrategyKind) -> Option<&'static ApplySpec> {
    APPLY_TABLE.iter().find(|spec| spec.kind == kind)
}

fn describe_dialogue(before: &TextStats, after: &TextStats) -> Vec<String> {
    if after.dialogue_lines > before.dialogue_lines {
        vec![format!(
            "Added {} lines of dialogue",
            after.dialogue_lines - before.dialogue_lines
        )]
    } else {
        vec!["Refined existing dialogue".to_string()]
    }
}

fn describe_pacing(before: &TextStats, after: &TextStats) -> Vec<String> {
    if after.words < before.words {
        vec![format!(
            "Tightened pacing, trimming {} words",
            before.words - after.words
        )]
    } else {
        vec!["Rebalanced scene pacing".to_string()]
    }
}

fn describe_structure(before: &TextStats, after: &TextStats) -> Vec<String> {
    if after.paragraphs != before.paragraphs {
        vec![format!(
            "Restructured into {} paragraphs (was {})",
            after.paragraphs, before.paragraphs
        )]
    } else {
        vec!["Clarified scene structure".to_string()]
    }
}

/// Describe a revision for the pass record.
pub fn describe_changes(kind: EnhancementStrategyKind, before: &str, after: &str) -> Vec<String> {
    let before_stats = TextStats::measure(before);
    let after_stats = TextStats::measure(after);

    let mut changes = lookup(kind)
        .map(|spec| (spec.describe)(&before_stats, &after_stats))
        .unwrap_or_default();
    if before_stats.words.abs_diff(after_stats.words) < LENGTH_TOLERANCE_WORDS {
        changes.push("Preserved story length".to_string());
    }
    if changes.is_empty() {
        changes.push(format!("Applied {} enhancement", kind));
    }
    changes
}

// ============================================================================
// Applier
// ============================================================================

/// Result of applying one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEnhancement {
    pub artifact: String,
    pub changes: Vec<String>,
}

/// Runs revision calls through the backend with retry and timeout.
pub struct EnhancementApplier {
    backend: Arc<dyn TextBackend>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl EnhancementApplier {
    pub fn new(backend: Arc<dyn TextBackend>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            backend,
            retry,
            timeout,
        }
    }

    /// Revision guidance for a strategy given the current profile.
    pub fn hint(
        strategy: &EnhancementStrategy,
        profile: &QualityProfile,
        request: &GenerationRequest,
    ) -> RevisionHint {
        let focus = lookup(strategy.kind)
            .map(|spec| spec.focus.to_string())
            .unwrap_or_else(|| format!("Apply {} to the story.", strategy.kind));

        RevisionHint {
            strategy_id: strategy.id().to_string(),
            focus,
            target_dimensions: strategy.targets.clone(),
            current_scores: strategy
                .targets
                .iter()
                .map(|d| (*d, profile.score(*d)))
                .collect(),
            genre: request.genre.clone(),
            target_word_count: request.target_word_count,
        }
    }

    /// Revise `artifact` with `strategy`. Transient failures are retried;
    /// the returned error is fatal, exhausted or a cancellation.
    pub async fn apply(
        &self,
        strategy: &EnhancementStrategy,
        artifact: &str,
        profile: &QualityProfile,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> BackendResult<AppliedEnhancement> {
        let hint = Self::hint(strategy, profile, request);
        let backend = self.backend.clone();
        let operation = format!("revise:{}", strategy.id());

        let revised = call_with_retry(&self.retry, self.timeout, &operation, cancel, |ctx| {
            let backend = backend.clone();
            let hint = hint.clone();
            let artifact = artifact.to_string();
            async move { backend.revise_artifact(&artifact, &hint, &ctx).await }
        })
        .await?;

        let changes = describe_changes(strategy.kind, artifact, &revised);
        debug!(
            strategy = %strategy.kind,
            changes = changes.len(),
            "Enhancement applied"
        );

        Ok(AppliedEnhancement {
            artifact: revised,
            changes,
        })
    }
}
