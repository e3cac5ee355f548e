//! Diagnostic reporting for the dompatch engine.
//!
//! Loading, merging and applying never propagate errors to the caller; they
//! emit [`Diagnostic`]s into a caller-supplied [`DiagnosticSink`] instead.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A configuration document failed to fetch or parse
    LoadError,

    /// The merged configuration is empty or an action has an unknown type
    ConfigurationError,

    /// A single action failed to dispatch
    ActionError,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::LoadError => "load error",
            DiagnosticKind::ConfigurationError => "configuration error",
            DiagnosticKind::ActionError => "action error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,

    /// Structural content of the offending action, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,

    /// Identifier of the offending configuration document, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub emitted_at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            source: None,
            emitted_at: Utc::now(),
        }
    }

    pub fn load_error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::LoadError, message).with_source(source)
    }

    pub fn configuration_error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::ConfigurationError, message)
    }

    pub fn action_error(message: impl Into<String>, action: Value) -> Self {
        Self::new(DiagnosticKind::ActionError, message).with_action(action)
    }

    pub fn with_action(mut self, action: Value) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " [{}]", source)?;
        }
        if let Some(action) = &self.action {
            write!(f, " - {}", action)?;
        }
        Ok(())
    }
}

/// Receiver of diagnostics emitted while loading and applying configurations.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Send + Sync,
{
    fn emit(&self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Default sink: forwards every diagnostic to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let action = diagnostic
            .action
            .as_ref()
            .map(|value| value.to_string())
            .unwrap_or_default();
        let source = diagnostic.source.as_deref().unwrap_or_default();
        match diagnostic.kind {
            DiagnosticKind::ActionError => error!(
                target: "dompatch::diagnostics",
                kind = %diagnostic.kind,
                action = %action,
                "{}",
                diagnostic.message
            ),
            DiagnosticKind::LoadError => error!(
                target: "dompatch::diagnostics",
                kind = %diagnostic.kind,
                source = %source,
                "{}",
                diagnostic.message
            ),
            DiagnosticKind::ConfigurationError => warn!(
                target: "dompatch::diagnostics",
                kind = %diagnostic.kind,
                action = %action,
                "{}",
                diagnostic.message
            ),
        }
    }
}

/// Records diagnostics in memory; mainly for tests and reports.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

/// Sends diagnostics over an unbounded channel so another task can consume them.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Diagnostic>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Diagnostic>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl DiagnosticSink for ChannelSink {
    fn emit(&self, diagnostic: Diagnostic) {
        // A dropped receiver means nobody is listening anymore.
        let _ = self.sender.send(diagnostic);
    }
}

/// Forwards each diagnostic to every wrapped sink, in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn DiagnosticSink>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl DiagnosticSink for FanoutSink {
    fn emit(&self, diagnostic: Diagnostic) {
        for sink in &self.sinks {
            sink.emit(diagnostic.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_sink_filters_by_kind() {
        let sink = MemorySink::new();
        sink.emit(Diagnostic::configuration_error("unsupported action type: x"));
        sink.emit(Diagnostic::action_error(
            "target not found: #b",
            json!({ "type": "insert" }),
        ));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.of_kind(DiagnosticKind::ActionError).len(), 1);
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let sink = move |diagnostic: Diagnostic| captured.lock().push(diagnostic.kind);
        sink.emit(Diagnostic::load_error("a.yaml", "missing"));
        assert_eq!(*seen.lock(), vec![DiagnosticKind::LoadError]);
    }

    #[test]
    fn display_includes_context() {
        let diagnostic = Diagnostic::action_error("boom", json!({ "type": "remove" }));
        assert_eq!(diagnostic.to_string(), r#"action error: boom - {"type":"remove"}"#);

        let load = Diagnostic::load_error("config/a.yaml", "not found");
        assert_eq!(load.to_string(), "load error: not found [config/a.yaml]");
    }

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        let fanout = FanoutSink::default()
            .with(Arc::new(sink))
            .with(Arc::new(TracingSink));
        fanout.emit(Diagnostic::configuration_error("first"));
        fanout.emit(Diagnostic::configuration_error("second"));

        assert_eq!(rx.recv().await.map(|d| d.message), Some("first".into()));
        assert_eq!(rx.recv().await.map(|d| d.message), Some("second".into()));
    }
}
