//! Flow execution error types

use thiserror::Error;

/// Raised when a caller asks a finished apply run to account for itself.
///
/// The scheduler never returns these while applying; failures are reported
/// per step and the run always completes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Nothing was applied because the merged configuration had no actions
    #[error("invalid or empty configuration, nothing to apply")]
    EmptyConfiguration,

    /// At least one step failed
    #[error("{failed} of {total} actions failed; first failure at step {first_step}: {reason}")]
    StepsFailed {
        failed: usize,
        total: usize,
        first_step: usize,
        reason: String,
    },

    /// At least one step had a type the dispatcher does not know
    #[error("{0} actions have an unsupported type")]
    Unrecognized(usize),
}
