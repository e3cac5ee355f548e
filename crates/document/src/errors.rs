//! Error types for document operations

use thiserror::Error;

use crate::tree::NodeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Selector is well-formed but uses a feature this engine does not evaluate
    #[error("unsupported selector '{selector}': {feature}")]
    UnsupportedSelector { selector: String, feature: String },

    /// Node is not attached to a parent
    #[error("node {0} has no parent")]
    Detached(NodeId),

    /// Handle does not refer to a node of the expected kind
    #[error("invalid node handle {0}")]
    InvalidHandle(NodeId),

    /// Document has no body element
    #[error("document has no body element")]
    MissingBody,
}

impl DocumentError {
    pub(crate) fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported_selector(selector: &str, feature: impl Into<String>) -> Self {
        Self::UnsupportedSelector {
            selector: selector.to_string(),
            feature: feature.into(),
        }
    }
}
