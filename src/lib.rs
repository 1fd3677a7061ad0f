//! Story Forge - Quality-Driven Story Generation
//!
//! This library provides the workflow engine that turns a generation request
//! into a scored, iteratively enhanced story.
//! It includes:
//! - The stage-machine workflow engine with convergence detection
//! - Generation strategy selection and the enhancement strategy catalog
//! - Backend-driven quality assessment
//! - Telemetry, run history and engine configuration

pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use models::{
    EngineConfig, EnhancementPass, EnhancementStrategy, EnhancementStrategyKind,
    GenerationStrategy, RunError, RunErrorKind, RunOutcome, RunSummary, StopReason,
    StrategyPlan, WorkflowRun,
};
pub use services::workflow::{WorkflowEngine, WorkflowEvent};
pub use utils::error::{AppError, AppResult};
