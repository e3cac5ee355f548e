//! Core data types for action primitives

/// Result of a dispatch that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action ran; `mutations` counts the nodes (or pattern matches) it touched
    Applied { mutations: usize },

    /// The action's type is not one of the known variants; nothing was done
    Unrecognized { type_name: Option<String> },
}

impl DispatchOutcome {
    pub fn mutations(&self) -> usize {
        match self {
            DispatchOutcome::Applied { mutations } => *mutations,
            DispatchOutcome::Unrecognized { .. } => 0,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { .. })
    }
}
