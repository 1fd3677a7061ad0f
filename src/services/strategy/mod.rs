//! Strategy Selection Service
//!
//! Requirement analysis and generation strategy selection.
//!
//! ## Strategies
//! - **Direct**: single generation call
//! - **Outline First**: structural outline, then the full draft
//! - **Iterative**: direct or outlined draft with the full enhancement budget

pub mod analyzer;
pub mod selector;

pub use analyzer::RequirementAnalyzer;
pub use selector::StrategySelector;
