use std::sync::Arc;

use action_flow::{merge, ActionScheduler, StepOutcome};
use dompatch_core_types::Configuration;
use dompatch_document::{Document, HtmlDocument};
use dompatch_event_bus::{DiagnosticKind, MemorySink};
use pretty_assertions::assert_eq;

fn yaml(text: &str) -> Configuration {
    serde_yaml::from_str(text).unwrap()
}

fn scheduler() -> (ActionScheduler, Arc<MemorySink>) {
    let sink = MemorySink::new();
    (ActionScheduler::new(sink.clone()), sink)
}

#[test]
fn insert_with_lower_priority_runs_before_remove() {
    let (scheduler, sink) = scheduler();
    let mut document = HtmlDocument::parse(
        r#"<html><body><div class="ad">ad</div><h1>Title</h1></body></html>"#,
    );

    let first = yaml(
        r#"
actions:
  - type: remove
    selector: .ad
    priority: 2
"#,
    );
    let second = yaml(
        r#"
actions:
  - type: insert
    target: .ad
    element: "<p class='note'>sponsored</p>"
    position: after
    priority: 1
"#,
    );

    let merged = merge(vec![Some(first), Some(second)]);
    let report = scheduler.apply(&mut document, &merged);

    assert_eq!(
        report.steps.iter().map(|s| s.kind.as_str()).collect::<Vec<_>>(),
        vec!["insert", "remove"]
    );
    assert_eq!(
        document.body_markup().unwrap(),
        r#"<p class="note">sponsored</p><h1>Title</h1>"#
    );
    assert!(sink.is_empty());
}

#[test]
fn failed_insert_does_not_block_later_actions() {
    let (scheduler, sink) = scheduler();
    let mut document = HtmlDocument::parse("<body><p>keep</p><span>drop</span></body>");
    let config = yaml(
        r##"
actions:
  - type: insert
    target: "#missing"
    element: "<i>x</i>"
    position: before
  - type: remove
    selector: span
"##,
    );

    let report = scheduler.apply(&mut document, &merge(vec![Some(config)]));

    assert_eq!(document.body_markup().unwrap(), "<p>keep</p>");
    assert!(report.steps[0].outcome.is_failed());
    assert_eq!(report.steps[1].outcome, StepOutcome::Applied { mutations: 1 });

    let errors = sink.of_kind(DiagnosticKind::ActionError);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].action.as_ref().and_then(|a| a["target"].as_str()),
        Some("#missing")
    );
}

#[test]
fn unknown_type_leaves_the_rest_in_order() {
    let (scheduler, sink) = scheduler();
    let mut document = HtmlDocument::parse("<body><p>foo</p><b>bold</b></body>");
    let config = yaml(
        r#"
actions:
  - type: alter
    oldValue: foo
    newValue: bar
    priority: 3
  - type: unknown
  - type: replace
    selector: b
    newElement: <strong>bold</strong>
"#,
    );

    let report = scheduler.apply(&mut document, &merge(vec![None, Some(config), None]));

    assert_eq!(
        report.steps.iter().map(|s| s.kind.as_str()).collect::<Vec<_>>(),
        vec!["unknown", "replace", "alter"]
    );
    assert_eq!(
        document.body_markup().unwrap(),
        "<p>bar</p><strong>bold</strong>"
    );
    assert_eq!(sink.of_kind(DiagnosticKind::ConfigurationError).len(), 1);
    assert!(report.ensure_success(true).is_ok());
    assert!(report.ensure_success(false).is_err());
}

#[test]
fn all_loads_failed_means_nothing_to_apply() {
    let (scheduler, sink) = scheduler();
    let mut document = HtmlDocument::parse("<body><p>untouched</p></body>");

    let report = scheduler.apply(&mut document, &merge(vec![None, None]));

    assert!(report.is_empty());
    assert_eq!(document.body_markup().unwrap(), "<p>untouched</p>");
    assert_eq!(sink.of_kind(DiagnosticKind::ConfigurationError).len(), 1);
    assert!(report.ensure_success(true).is_err());
}
