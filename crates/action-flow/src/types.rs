//! Core types for apply runs

use action_primitives::{ActionError, DispatchOutcome};
use chrono::{DateTime, Utc};
use dompatch_core_types::Priority;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::FlowError;

/// What happened to one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Dispatched without error
    Applied { mutations: usize },

    /// Type not recognized; reported as a configuration error and skipped
    Unrecognized { type_name: Option<String> },

    /// Dispatch raised an error; reported and skipped
    Failed { code: String, error: String },
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

impl From<DispatchOutcome> for StepOutcome {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Applied { mutations } => StepOutcome::Applied { mutations },
            DispatchOutcome::Unrecognized { type_name } => StepOutcome::Unrecognized { type_name },
        }
    }
}

impl From<&ActionError> for StepOutcome {
    fn from(err: &ActionError) -> Self {
        StepOutcome::Failed {
            code: err.code().to_string(),
            error: err.to_string(),
        }
    }
}

/// Step execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Position in dispatch order, starting at 0
    pub step: usize,

    /// Position in the merged configuration
    pub source_index: usize,

    /// Action type as written
    pub kind: String,

    /// Effective priority used for ordering
    pub priority: Priority,

    /// The action's full content
    pub action: Value,

    pub outcome: StepOutcome,

    /// Start time
    pub started_at: DateTime<Utc>,

    /// Latency in microseconds
    pub latency_us: u64,
}

/// Apply run result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Start time
    pub started_at: DateTime<Utc>,

    /// Finish time
    pub finished_at: DateTime<Utc>,

    /// Total latency in milliseconds
    pub latency_ms: u64,

    /// One entry per action, in dispatch order
    pub steps: Vec<StepResult>,
}

impl ApplyReport {
    /// Create an empty report starting now
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            steps: Vec::new(),
        }
    }

    /// Add step result
    pub fn with_step(mut self, result: StepResult) -> Self {
        self.steps.push(result);
        self
    }

    /// Set finish time and calculate latency
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn applied(&self) -> usize {
        self.count(|outcome| matches!(outcome, StepOutcome::Applied { .. }))
    }

    pub fn unrecognized(&self) -> usize {
        self.count(|outcome| matches!(outcome, StepOutcome::Unrecognized { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(StepOutcome::is_failed)
    }

    /// Sum of the mutation counts of applied steps
    pub fn mutations(&self) -> usize {
        self.steps
            .iter()
            .map(|step| match step.outcome {
                StepOutcome::Applied { mutations } => mutations,
                _ => 0,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Turn a run into an error when it did not fully apply.
    ///
    /// Empty runs, failures and, when `allow_unrecognized` is false, unknown
    /// action types all count against it.
    pub fn ensure_success(&self, allow_unrecognized: bool) -> Result<(), FlowError> {
        if self.is_empty() {
            return Err(FlowError::EmptyConfiguration);
        }
        if let Some(first) = self.steps.iter().find(|step| step.outcome.is_failed()) {
            let reason = match &first.outcome {
                StepOutcome::Failed { error, .. } => error.clone(),
                _ => String::new(),
            };
            return Err(FlowError::StepsFailed {
                failed: self.failed(),
                total: self.total(),
                first_step: first.step,
                reason,
            });
        }
        let unrecognized = self.unrecognized();
        if !allow_unrecognized && unrecognized > 0 {
            return Err(FlowError::Unrecognized(unrecognized));
        }
        Ok(())
    }

    fn count(&self, predicate: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps
            .iter()
            .filter(|step| predicate(&step.outcome))
            .count()
    }
}

impl Default for ApplyReport {
    fn default() -> Self {
        Self::new()
    }
}
