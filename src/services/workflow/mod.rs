//! Workflow Service
//!
//! The stage-machine engine, its convergence tracking and the progress
//! events it streams.

pub mod convergence;
pub mod engine;
pub mod events;

pub use convergence::{ConvergenceSignal, ConvergenceTracker};
pub use engine::WorkflowEngine;
pub use events::WorkflowEvent;
