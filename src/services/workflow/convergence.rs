//! Convergence Detection
//!
//! Tracks overall-score deltas across enhancement passes. A pass whose gain
//! is at or below the threshold counts as stalled; `window` consecutive
//! stalled passes mean the loop has converged. Any negative delta is a
//! regression and stops the loop immediately.

use story_forge_quality::round2;

/// Verdict after observing one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceSignal {
    Continue,
    Converged,
    Regressed,
}

/// Per-run convergence state.
#[derive(Debug, Clone)]
pub struct ConvergenceTracker {
    threshold: f64,
    window: u32,
    stalled: u32,
    deltas: Vec<f64>,
}

impl ConvergenceTracker {
    pub fn new(threshold: f64, window: u32) -> Self {
        Self {
            threshold,
            window: window.max(1),
            stalled: 0,
            deltas: Vec::new(),
        }
    }

    /// Record a pass that moved the overall score from `before` to `after`.
    pub fn observe(&mut self, before: f64, after: f64) -> ConvergenceSignal {
        let delta = round2(after - before);
        self.deltas.push(delta);

        if delta < 0.0 {
            return ConvergenceSignal::Regressed;
        }

        if delta <= self.threshold {
            self.stalled += 1;
        } else {
            self.stalled = 0;
        }

        if self.stalled >= self.window {
            ConvergenceSignal::Converged
        } else {
            ConvergenceSignal::Continue
        }
    }

    /// Deltas observed so far, in pass order.
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    pub fn stalled_passes(&self) -> u32 {
        self.stalled
    }
}
