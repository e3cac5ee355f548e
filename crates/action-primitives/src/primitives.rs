//! Action dispatcher
//!
//! Four primitives, one per action variant:
//! 1. remove - detach every element matching a selector
//! 2. replace - substitute every match with a freshly parsed fragment
//! 3. insert - place a fragment before or after the first match of a target
//! 4. alter - regex-rewrite the body's serialized markup

mod alter;
mod insert;
mod remove;
mod replace;

pub use alter::*;
pub use insert::*;
pub use remove::*;
pub use replace::*;

use std::sync::Arc;

use dompatch_core_types::{Action, ActionKind};
use dompatch_document::Document;
use dompatch_event_bus::{Diagnostic, DiagnosticSink, TracingSink};
use tracing::debug;

use crate::{errors::ActionError, types::DispatchOutcome};

/// Executes single actions against a document.
///
/// Holds no state between dispatches other than the sink that receives
/// configuration diagnostics.
#[derive(Clone)]
pub struct ActionDispatcher {
    sink: Arc<dyn DiagnosticSink>,
}

impl ActionDispatcher {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// Execute one action.
    ///
    /// Missing required fields and execution failures are returned as
    /// [`ActionError`]. An unrecognized type is reported to the sink as a
    /// configuration error and yields [`DispatchOutcome::Unrecognized`].
    pub fn dispatch<D: Document>(
        &self,
        document: &mut D,
        action: &Action,
    ) -> Result<DispatchOutcome, ActionError> {
        debug!(kind = %action.kind().name(), priority = action.effective_priority(), "Dispatching action");

        let mutations = match action.kind() {
            ActionKind::Remove { selector } => {
                let selector = required("remove", "selector", selector)?;
                execute_remove(document, selector)?
            }
            ActionKind::Replace {
                selector,
                new_element,
            } => {
                let selector = required("replace", "selector", selector)?;
                let new_element = required("replace", "newElement", new_element)?;
                execute_replace(document, selector, new_element)?
            }
            ActionKind::Insert {
                target,
                element,
                position,
            } => {
                let target = required("insert", "target", target)?;
                let element = required("insert", "element", element)?;
                // position is checked only once the target resolves
                execute_insert(document, target, element, position.as_deref())?
            }
            ActionKind::Alter {
                old_value,
                new_value,
            } => {
                let old_value = required_non_empty("alter", "oldValue", old_value)?;
                let new_value = required_non_empty("alter", "newValue", new_value)?;
                execute_alter(document, old_value, new_value)?
            }
            ActionKind::Unknown { type_name } => {
                let label = type_name.as_deref().unwrap_or("<missing>");
                self.sink.emit(
                    Diagnostic::configuration_error(format!("unsupported action type: {}", label))
                        .with_action(action.raw().clone()),
                );
                return Ok(DispatchOutcome::Unrecognized {
                    type_name: type_name.clone(),
                });
            }
        };

        Ok(DispatchOutcome::Applied { mutations })
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

fn required<'a>(
    kind: &'static str,
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, ActionError> {
    value
        .as_deref()
        .ok_or_else(|| ActionError::missing(kind, field))
}

fn required_non_empty<'a>(
    kind: &'static str,
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, ActionError> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ActionError::missing(kind, field)),
    }
}
