//! Data Models
//!
//! Configuration, strategy, enhancement and run data structures.

pub mod enhancement;
pub mod run;
pub mod settings;
pub mod strategy;

pub use enhancement::*;
pub use run::*;
pub use settings::*;
pub use strategy::*;
