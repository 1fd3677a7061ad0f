//! Assessment Service
//!
//! Backend-driven dimension scoring plugged into the concurrent
//! `AssessmentPipeline` from `story_forge_quality`.

pub mod backend_assessor;

pub use backend_assessor::BackendDimensionAssessor;
