//! Replace primitive - Substitute matched elements with parsed markup

use dompatch_document::Document;
use tracing::debug;

use crate::errors::ActionError;

/// Replace every element matching `selector` with `new_element`, parsed.
///
/// Each match gets its own fragment instance; a single parsed fragment is
/// never moved between positions.
pub fn execute_replace<D: Document>(
    document: &mut D,
    selector: &str,
    new_element: &str,
) -> Result<usize, ActionError> {
    let matches = document.select_all(selector)?;
    debug!(selector = %selector, matches = matches.len(), "Executing replace primitive");

    for node in &matches {
        let fragment = document.parse_fragment(new_element)?;
        document.replace_node(*node, fragment)?;
    }
    Ok(matches.len())
}
