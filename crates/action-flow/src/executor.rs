//! Action scheduler implementation

use std::sync::Arc;
use std::time::Instant;

use action_primitives::ActionDispatcher;
use chrono::Utc;
use dompatch_core_types::{Action, MergedConfiguration, Priority};
use dompatch_document::Document;
use dompatch_event_bus::{Diagnostic, DiagnosticSink, TracingSink};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::types::{ApplyReport, StepOutcome, StepResult};

/// Message of the diagnostic emitted when there is nothing to apply
pub const EMPTY_CONFIGURATION: &str = "invalid or empty configuration, nothing to apply";

/// One action in dispatch order.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep<'a> {
    /// Position in the merged configuration
    pub source_index: usize,
    pub priority: Priority,
    pub action: &'a Action,
}

/// Order the merged actions for dispatch: ascending priority, ties in merged order.
pub fn plan(config: &MergedConfiguration) -> Vec<PlannedStep<'_>> {
    let mut steps: Vec<PlannedStep<'_>> = config
        .actions
        .iter()
        .enumerate()
        .map(|(source_index, action)| PlannedStep {
            source_index,
            priority: action.effective_priority(),
            action,
        })
        .collect();
    // sort_by is stable
    steps.sort_by(|a, b| a.priority.total_cmp(&b.priority));
    steps
}

/// Applies a merged configuration to a document, one action at a time.
#[derive(Clone)]
pub struct ActionScheduler {
    dispatcher: ActionDispatcher,
    sink: Arc<dyn DiagnosticSink>,
}

impl ActionScheduler {
    /// Create a scheduler whose dispatcher reports to the same sink
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            dispatcher: ActionDispatcher::new(sink.clone()),
            sink,
        }
    }

    pub fn with_dispatcher(dispatcher: ActionDispatcher, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { dispatcher, sink }
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Apply every action of `config` to `document`.
    ///
    /// Never fails. An empty configuration is reported to the sink and leaves
    /// the document untouched. A failing action is reported with its full
    /// content and the run moves on to the next one.
    pub fn apply<D: Document>(&self, document: &mut D, config: &MergedConfiguration) -> ApplyReport {
        let mut report = ApplyReport::new();

        if config.is_empty() {
            debug!("{}", EMPTY_CONFIGURATION);
            self.sink
                .emit(Diagnostic::configuration_error(EMPTY_CONFIGURATION));
            return report.finish();
        }

        let steps = plan(config);
        info!("Applying {} actions", steps.len());

        for (step, planned) in steps.iter().enumerate() {
            debug!(
                "Executing step {}/{} (source #{}, priority {})",
                step + 1,
                steps.len(),
                planned.source_index,
                planned.priority
            );

            let started_at = Utc::now();
            let timer = Instant::now();
            let outcome = match self.dispatcher.dispatch(document, planned.action) {
                Ok(outcome) => StepOutcome::from(outcome),
                Err(err) => {
                    debug!(step, code = err.code(), "Action failed: {}", err);
                    self.sink.emit(Diagnostic::action_error(
                        err.to_string(),
                        planned.action.raw().clone(),
                    ));
                    StepOutcome::from(&err)
                }
            };

            report = report.with_step(StepResult {
                step,
                source_index: planned.source_index,
                kind: planned.action.kind().name().to_string(),
                priority: planned.priority,
                action: planned.action.raw().clone(),
                outcome,
                started_at,
                latency_us: timer.elapsed().as_micros() as u64,
            });
        }

        let report = report.finish();
        if report.failed() > 0 {
            warn!(
                "Applied {}/{} actions, {} failed",
                report.applied(),
                report.total(),
                report.failed()
            );
        } else {
            info!(
                "Applied {}/{} actions ({} mutations)",
                report.applied(),
                report.total(),
                report.mutations()
            );
        }
        report
    }
}

impl Default for ActionScheduler {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dompatch_core_types::Position;
    use dompatch_document::DocumentError;
    use dompatch_event_bus::{DiagnosticKind, MemorySink};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Records every capability call; selectors match nodes by exact name.
    #[derive(Default)]
    struct RecordingDocument {
        nodes: Vec<String>,
        calls: Vec<String>,
    }

    impl RecordingDocument {
        fn with_nodes(nodes: &[&str]) -> Self {
            Self {
                nodes: nodes.iter().map(|n| n.to_string()).collect(),
                calls: Vec::new(),
            }
        }
    }

    impl Document for RecordingDocument {
        type Node = usize;
        type Fragment = String;

        fn select_all(&self, selector: &str) -> Result<Vec<usize>, DocumentError> {
            if selector.starts_with('!') {
                return Err(DocumentError::InvalidSelector {
                    selector: selector.to_string(),
                    reason: "bang".into(),
                });
            }
            Ok(self
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, name)| name.as_str() == selector)
                .map(|(i, _)| i)
                .collect())
        }

        fn select_first(&self, selector: &str) -> Result<Option<usize>, DocumentError> {
            Ok(self.select_all(selector)?.into_iter().next())
        }

        fn remove_node(&mut self, node: usize) -> Result<(), DocumentError> {
            self.calls.push(format!("remove {}", node));
            Ok(())
        }

        fn replace_node(&mut self, node: usize, fragment: String) -> Result<(), DocumentError> {
            self.calls.push(format!("replace {} {}", node, fragment));
            Ok(())
        }

        fn insert_node(
            &mut self,
            reference: usize,
            fragment: String,
            position: Position,
        ) -> Result<(), DocumentError> {
            self.calls
                .push(format!("insert {} {} {}", position, reference, fragment));
            Ok(())
        }

        fn parse_fragment(&mut self, markup: &str) -> Result<String, DocumentError> {
            Ok(markup.to_string())
        }

        fn body_markup(&self) -> Result<String, DocumentError> {
            Ok(self.nodes.join(""))
        }

        fn set_body_markup(&mut self, markup: &str) -> Result<(), DocumentError> {
            self.calls.push(format!("set_body {}", markup));
            Ok(())
        }
    }

    fn scheduler() -> (ActionScheduler, Arc<MemorySink>) {
        let sink = MemorySink::new();
        (ActionScheduler::new(sink.clone()), sink)
    }

    #[test]
    fn dispatches_by_ascending_priority() {
        let (scheduler, _) = scheduler();
        let mut document = RecordingDocument::with_nodes(&["a", "b", "c"]);
        let config = MergedConfiguration::new(vec![
            Action::remove("a").with_priority(2),
            Action::remove("b").with_priority(1),
            Action::remove("c"),
        ]);

        let report = scheduler.apply(&mut document, &config);

        assert_eq!(document.calls, vec!["remove 2", "remove 1", "remove 0"]);
        assert_eq!(
            report.steps.iter().map(|s| s.source_index).collect::<Vec<_>>(),
            vec![2, 1, 0]
        );
    }

    #[test]
    fn equal_priorities_keep_merged_order() {
        let (scheduler, _) = scheduler();
        let mut document = RecordingDocument::with_nodes(&["a", "b", "c", "d"]);
        let config = MergedConfiguration::new(vec![
            Action::remove("a").with_priority(5),
            Action::remove("b"),
            Action::remove("c").with_priority(5),
            Action::remove("d").with_priority(0),
        ]);

        scheduler.apply(&mut document, &config);

        assert_eq!(
            document.calls,
            vec!["remove 1", "remove 3", "remove 0", "remove 2"]
        );
    }

    #[test]
    fn negative_priorities_run_first() {
        let config = MergedConfiguration::new(vec![
            Action::remove("a"),
            Action::remove("b").with_priority(-3),
        ]);
        let order: Vec<usize> = plan(&config).iter().map(|s| s.source_index).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn fractional_priorities_are_not_truncated() {
        let config = MergedConfiguration::new(vec![
            Action::remove("a").with_priority(1.5),
            Action::remove("b").with_priority(1),
            Action::remove("c").with_priority(1.25),
        ]);
        let order: Vec<usize> = plan(&config).iter().map(|s| s.source_index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn failures_do_not_stop_the_run() {
        let (scheduler, sink) = scheduler();
        let mut document = RecordingDocument::with_nodes(&["a", "b"]);
        let broken = json!({ "type": "insert", "target": "missing", "element": "<i/>", "position": "after" });
        let config = MergedConfiguration::new(vec![
            Action::remove("a"),
            Action::from_value(broken.clone()),
            Action::remove("!bad"),
            Action::remove("b"),
        ]);

        let report = scheduler.apply(&mut document, &config);

        assert_eq!(document.calls, vec!["remove 0", "remove 1"]);
        assert_eq!(report.total(), 4);
        assert_eq!(report.applied(), 2);
        assert_eq!(report.failed(), 2);

        let errors = sink.of_kind(DiagnosticKind::ActionError);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].action, Some(broken));
        assert_eq!(errors[0].message, "target element not found: missing");
        assert_eq!(
            report.steps[1].outcome,
            StepOutcome::Failed {
                code: "target_not_found".into(),
                error: "target element not found: missing".into(),
            }
        );
    }

    #[test]
    fn empty_configuration_is_reported_without_mutation() {
        let (scheduler, sink) = scheduler();
        let mut document = RecordingDocument::with_nodes(&["a"]);

        let report = scheduler.apply(&mut document, &MergedConfiguration::default());

        assert!(report.is_empty());
        assert!(document.calls.is_empty());
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiagnosticKind::ConfigurationError);
        assert_eq!(entries[0].message, EMPTY_CONFIGURATION);
    }

    #[test]
    fn unknown_types_are_reported_and_skipped() {
        let (scheduler, sink) = scheduler();
        let mut document = RecordingDocument::with_nodes(&["a"]);
        let config = MergedConfiguration::new(vec![
            Action::from_value(json!({ "type": "unknown" })),
            Action::remove("a"),
        ]);

        let report = scheduler.apply(&mut document, &config);

        assert_eq!(document.calls, vec!["remove 0"]);
        assert_eq!(report.unrecognized(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(sink.of_kind(DiagnosticKind::ConfigurationError).len(), 1);
        assert!(sink.of_kind(DiagnosticKind::ActionError).is_empty());
    }

    #[test]
    fn each_step_commits_before_the_next() {
        let (scheduler, _) = scheduler();
        let mut document = RecordingDocument::with_nodes(&["x"]);
        let config = MergedConfiguration::new(vec![
            Action::insert("x", "<b>", Position::Before),
            Action::alter("x", "y"),
            Action::replace("x", "<i>"),
        ]);

        scheduler.apply(&mut document, &config);

        assert_eq!(
            document.calls,
            vec!["insert before 0 <b>", "set_body y", "replace 0 <i>"]
        );
    }
}
