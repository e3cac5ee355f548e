//! End-to-end patch run: resolve, load, merge, apply

use std::sync::Arc;

use action_flow::{ActionScheduler, ApplyReport};
use dompatch_config_source::{load_and_merge, ConfigurationSource};
use dompatch_core_types::MergedConfiguration;
use dompatch_document::HtmlDocument;
use dompatch_event_bus::DiagnosticSink;
use tracing::info;

/// Patched markup plus what happened while producing it.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub html: String,
    pub report: ApplyReport,
}

/// Wires a configuration source to the scheduler.
pub struct Patcher {
    source: Arc<dyn ConfigurationSource>,
    scheduler: ActionScheduler,
}

impl Patcher {
    pub fn new(source: Arc<dyn ConfigurationSource>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            source,
            scheduler: ActionScheduler::new(sink),
        }
    }

    pub fn source(&self) -> &Arc<dyn ConfigurationSource> {
        &self.source
    }

    /// Identifiers registered for `location`
    pub async fn resolve(&self, location: &str) -> Vec<String> {
        self.source.resolve_configuration_identifiers(location).await
    }

    /// Load `identifiers` concurrently and merge them
    pub async fn load(&self, identifiers: &[String]) -> MergedConfiguration {
        load_and_merge(self.source.as_ref(), identifiers).await
    }

    /// Apply `config` to a parsed copy of `html`
    pub fn apply_to_html(&self, html: &str, config: &MergedConfiguration) -> PatchOutcome {
        let mut document = HtmlDocument::parse(html);
        let report = self.scheduler.apply(&mut document, config);
        PatchOutcome {
            html: document.to_html(),
            report,
        }
    }

    /// Patch `html` with the given configurations
    pub async fn patch_with(&self, html: &str, identifiers: &[String]) -> PatchOutcome {
        let config = self.load(identifiers).await;
        self.apply_to_html(html, &config)
    }

    /// Patch `html` with whatever the datasource registers for `location`
    pub async fn patch_location(&self, html: &str, location: &str) -> PatchOutcome {
        let identifiers = self.resolve(location).await;
        info!(location, configurations = identifiers.len(), "Patching page");
        self.patch_with(html, &identifiers).await
    }
}
