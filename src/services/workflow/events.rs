//! Workflow Events
//!
//! Progress events streamed to a consumer while a run executes. Each event
//! is sent after the run has fully advanced, so consumers only see
//! consistent states.

use serde::{Deserialize, Serialize};
use story_forge_core::WorkflowStage;
use uuid::Uuid;

use crate::models::run::{EnhancementPass, WorkflowRun};
use crate::models::strategy::StrategyPlan;

/// Progress event for streaming consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// The run entered a new stage
    StageEntered { run_id: Uuid, stage: WorkflowStage },
    /// The generation strategy was chosen
    StrategySelected { run_id: Uuid, plan: StrategyPlan },
    /// The first draft is available
    DraftReady {
        run_id: Uuid,
        word_count: usize,
        outlined: bool,
    },
    /// An artifact was scored. `pass_number` is 0 for the draft
    Assessed {
        run_id: Uuid,
        pass_number: u32,
        overall: f64,
    },
    /// An enhancement pass was recorded
    PassCompleted { run_id: Uuid, pass: EnhancementPass },
    /// The run reached a terminal state
    Finished { run: Box<WorkflowRun> },
}

impl WorkflowEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            WorkflowEvent::StageEntered { run_id, .. }
            | WorkflowEvent::StrategySelected { run_id, .. }
            | WorkflowEvent::DraftReady { run_id, .. }
            | WorkflowEvent::Assessed { run_id, .. }
            | WorkflowEvent::PassCompleted { run_id, .. } => *run_id,
            WorkflowEvent::Finished { run } => run.id(),
        }
    }
}
