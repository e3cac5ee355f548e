//! Error types for action primitives

use dompatch_document::DocumentError;
use thiserror::Error;

/// Failure of a single action. Raised at dispatch time only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// A field required by the action's variant is absent (or empty, for alter)
    #[error("{kind} action requires '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// Insert target matched no element
    #[error("target element not found: {0}")]
    TargetNotFound(String),

    /// Insert position is neither "before" nor "after"
    #[error("unsupported position: {0}")]
    UnsupportedPosition(String),

    /// Alter pattern is not a valid regular expression
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The document rejected an operation (bad selector, detached node, no body)
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl ActionError {
    pub(crate) fn missing(kind: &'static str, field: &'static str) -> Self {
        ActionError::MissingField { kind, field }
    }

    /// Stable short label, suitable for metrics and log fields
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::MissingField { .. } => "missing_field",
            ActionError::TargetNotFound(_) => "target_not_found",
            ActionError::UnsupportedPosition(_) => "unsupported_position",
            ActionError::InvalidPattern { .. } => "invalid_pattern",
            ActionError::Document(_) => "document",
        }
    }

    /// Whether the action itself is malformed, as opposed to failing against this document
    pub fn is_authoring_error(&self) -> bool {
        matches!(
            self,
            ActionError::MissingField { .. }
                | ActionError::UnsupportedPosition(_)
                | ActionError::InvalidPattern { .. }
                | ActionError::Document(DocumentError::InvalidSelector { .. })
        )
    }
}
