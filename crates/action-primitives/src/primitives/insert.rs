//! Insert primitive - Place markup next to a target element

use dompatch_core_types::Position;
use dompatch_document::Document;
use tracing::debug;

use crate::errors::ActionError;

/// Insert `element` before or after the first element matching `target`.
///
/// Steps:
/// 1. Resolve the target; fail if nothing matches
/// 2. Parse the fragment
/// 3. Interpret the position; fail if absent or anything but "before"/"after"
/// 4. Insert
pub fn execute_insert<D: Document>(
    document: &mut D,
    target: &str,
    element: &str,
    position: Option<&str>,
) -> Result<usize, ActionError> {
    debug!(target = %target, position = ?position, "Executing insert primitive");

    let reference = document
        .select_first(target)?
        .ok_or_else(|| ActionError::TargetNotFound(target.to_string()))?;

    let fragment = document.parse_fragment(element)?;

    let position = position.ok_or_else(|| ActionError::missing("insert", "position"))?;
    let position: Position = position
        .parse()
        .map_err(|_| ActionError::UnsupportedPosition(position.to_string()))?;

    document.insert_node(reference, fragment, position)?;
    Ok(1)
}
