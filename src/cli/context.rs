use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use dompatch_config_source::FileSource;
use dompatch_event_bus::{DiagnosticSink, FanoutSink, MemorySink, TracingSink};
use url::Url;

use super::output::OutputFormat;
use crate::settings::Settings;

pub struct CliContext {
    settings: Arc<Settings>,
    settings_path: PathBuf,
    format: OutputFormat,
}

impl CliContext {
    pub fn new(settings: Settings, settings_path: PathBuf, format: OutputFormat) -> Self {
        Self {
            settings: Arc::new(settings),
            settings_path,
            format,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings.as_ref()
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Diagnostics go to the log and are kept for the command's own report
    pub fn sinks(&self) -> (Arc<dyn DiagnosticSink>, Arc<MemorySink>) {
        let memory = MemorySink::new();
        let fanout = FanoutSink::default()
            .with(Arc::new(TracingSink))
            .with(memory.clone());
        (Arc::new(fanout), memory)
    }

    /// File source configured from settings, optionally pointing at another datasource
    pub fn file_source(
        &self,
        datasource: Option<&str>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<FileSource> {
        let settings = self.settings();
        let mut source = FileSource::new(&settings.base_dir)
            .with_datasource(datasource.unwrap_or(&settings.datasource))
            .with_sink(sink)
            .with_timeout(settings.http_timeout())
            .context("Failed to build configuration source")?;
        if let Some(base_url) = &settings.base_url {
            let url = Url::parse(base_url)
                .with_context(|| format!("Invalid base_url in settings: {}", base_url))?;
            source = source.with_base_url(url);
        }
        Ok(source)
    }
}
