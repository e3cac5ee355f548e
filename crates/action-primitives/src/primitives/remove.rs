//! Remove primitive - Detach every element matching a selector

use dompatch_document::Document;
use tracing::debug;

use crate::errors::ActionError;

/// Remove all elements matching `selector`, in document order.
///
/// Zero matches is a no-op. Returns the number of elements removed.
pub fn execute_remove<D: Document>(document: &mut D, selector: &str) -> Result<usize, ActionError> {
    let matches = document.select_all(selector)?;
    debug!(selector = %selector, matches = matches.len(), "Executing remove primitive");

    for node in &matches {
        document.remove_node(*node)?;
    }
    Ok(matches.len())
}
