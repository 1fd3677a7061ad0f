//! Services
//!
//! Business logic for the workflow engine and its collaborators.

pub mod assessment;
pub mod enhancement;
pub mod strategy;
pub mod telemetry;
pub mod workflow;

pub use assessment::BackendDimensionAssessor;
pub use enhancement::{EnhancementApplier, EnhancementCatalog};
pub use strategy::{RequirementAnalyzer, StrategySelector};
pub use telemetry::{NoopTelemetry, RunHistory, TelemetryRecorder, TelemetrySink};
pub use workflow::{WorkflowEngine, WorkflowEvent};
