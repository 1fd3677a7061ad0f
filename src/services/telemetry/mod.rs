//! Telemetry Service
//!
//! Fire-and-forget stage telemetry and the bounded run history used for
//! reporting.

mod history;
mod recorder;

pub use history::*;
pub use recorder::*;
