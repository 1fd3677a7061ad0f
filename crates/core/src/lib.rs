//! Story Forge Core
//!
//! Foundational types for the Story Forge workspace: the generation request
//! model, the quality dimension set, the workflow stage machine and the core
//! error type. This crate has no dependency on backends, async runtimes or
//! configuration loading.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `request` - Generation request model (`Genre`, `LengthClass`, `GenerationRequest`)
//! - `dimension` - Quality dimensions (`QualityDimension`)
//! - `stage` - Workflow stage machine (`WorkflowStage`)
//! - `builders` - Request builder (`GenerationRequestBuilder`)

pub mod error;
pub mod request;
pub mod dimension;
pub mod stage;
pub mod builders;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Request Model ──────────────────────────────────────────────────────
pub use request::{
    Genre, GenerationRequest, LengthClass, DEFAULT_ENHANCEMENT_PASSES, MAX_ENHANCEMENT_PASSES,
    MAX_QUALITY_SCORE,
};

// ── Dimensions & Stages ────────────────────────────────────────────────
pub use dimension::QualityDimension;
pub use stage::WorkflowStage;

// ── Builders ───────────────────────────────────────────────────────────
pub use builders::GenerationRequestBuilder;
