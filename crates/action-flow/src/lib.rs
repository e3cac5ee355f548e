//! Merge-and-apply layer
//!
//! Concatenates loaded configurations into one action list and applies it to
//! a document in priority order, isolating each action's failure from the
//! rest of the run.

pub mod errors;
pub mod executor;
pub mod merge;
pub mod types;

pub use errors::FlowError;
pub use executor::{plan, ActionScheduler, PlannedStep, EMPTY_CONFIGURATION};
pub use merge::merge;
pub use types::{ApplyReport, StepOutcome, StepResult};
