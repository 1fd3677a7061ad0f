//! Workflow Stage Machine
//!
//! `Received → Analyzed → StrategySelected → Drafted → Assessed →
//! {Enhancing → Assessed}* → Finalized | Failed`
//!
//! `Finalized` and `Failed` are absorbing. Every non-terminal stage may move
//! to `Failed` (validation, fatal backend error, cancellation).

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Stage of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Received,
    Analyzed,
    StrategySelected,
    Drafted,
    Assessed,
    Enhancing,
    Finalized,
    Failed,
}

impl WorkflowStage {
    /// Whether the stage is absorbing.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Finalized | WorkflowStage::Failed)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(&self, next: WorkflowStage) -> bool {
        use WorkflowStage::*;
        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Received, Analyzed)
                | (Analyzed, StrategySelected)
                | (StrategySelected, Drafted)
                | (Drafted, Assessed)
                | (Assessed, Enhancing)
                | (Enhancing, Assessed)
                | (Assessed, Finalized)
        )
    }

    /// Validate a transition, returning the target stage.
    pub fn transition(&self, next: WorkflowStage) -> CoreResult<WorkflowStage> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::invalid_transition(self, next))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Received => "received",
            WorkflowStage::Analyzed => "analyzed",
            WorkflowStage::StrategySelected => "strategy_selected",
            WorkflowStage::Drafted => "drafted",
            WorkflowStage::Assessed => "assessed",
            WorkflowStage::Enhancing => "enhancing",
            WorkflowStage::Finalized => "finalized",
            WorkflowStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
