//! Run History
//!
//! Bounded, in-memory record of the most recent completed runs, kept as
//! summaries for reporting. Oldest entries are evicted first.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::run::{RunOutcome, RunSummary};
use crate::models::strategy::GenerationStrategy;

/// Aggregate results for one generation strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyStatistics {
    pub strategy: GenerationStrategy,
    pub runs: u32,
    pub successes: u32,
    pub success_rate: f64,
    /// Mean over runs that produced a score
    pub mean_final_score: Option<f64>,
    pub mean_passes: f64,
    pub mean_duration_ms: f64,
}

#[derive(Default)]
struct Accumulator {
    runs: u32,
    successes: u32,
    scored: u32,
    score_total: f64,
    pass_total: u64,
    duration_total: u64,
}

/// Ring buffer of run summaries.
pub struct RunHistory {
    capacity: usize,
    summaries: RwLock<VecDeque<RunSummary>>,
}

impl RunHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            summaries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a completed run, evicting the oldest when full.
    pub async fn record(&self, summary: RunSummary) {
        let mut summaries = self.summaries.write().await;
        while summaries.len() >= self.capacity {
            summaries.pop_front();
        }
        summaries.push_back(summary);
    }

    /// The `n` most recent summaries, newest first.
    pub async fn recent(&self, n: usize) -> Vec<RunSummary> {
        let summaries = self.summaries.read().await;
        summaries.iter().rev().take(n).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.summaries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.summaries.read().await.is_empty()
    }

    /// Per-strategy statistics over the retained runs. Runs that never
    /// reached strategy selection are excluded.
    pub async fn strategy_statistics(&self) -> Vec<StrategyStatistics> {
        let summaries = self.summaries.read().await;
        let mut by_strategy: BTreeMap<GenerationStrategy, Accumulator> = BTreeMap::new();

        for summary in summaries.iter() {
            let Some(strategy) = summary.strategy else {
                continue;
            };
            let acc = by_strategy.entry(strategy).or_default();
            acc.runs += 1;
            if summary.outcome == Some(RunOutcome::Success) {
                acc.successes += 1;
            }
            if let Some(score) = summary.final_score {
                acc.scored += 1;
                acc.score_total += score;
            }
            acc.pass_total += summary.pass_count as u64;
            acc.duration_total += summary.duration_ms;
        }

        by_strategy
            .into_iter()
            .map(|(strategy, acc)| {
                let runs = acc.runs.max(1) as f64;
                StrategyStatistics {
                    strategy,
                    runs: acc.runs,
                    successes: acc.successes,
                    success_rate: acc.successes as f64 / runs,
                    mean_final_score: (acc.scored > 0)
                        .then(|| acc.score_total / acc.scored as f64),
                    mean_passes: acc.pass_total as f64 / runs,
                    mean_duration_ms: acc.duration_total as f64 / runs,
                }
            })
            .collect()
    }
}
