//! Enhancement Service
//!
//! Strategy catalog with weighted-deficit selection, and the apply table
//! that turns a selected strategy into a backend revision.

pub mod apply;
pub mod catalog;

pub use apply::{describe_changes, AppliedEnhancement, EnhancementApplier, TextStats};
pub use catalog::EnhancementCatalog;
