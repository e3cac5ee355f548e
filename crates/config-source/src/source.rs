//! Configuration sources

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dompatch_core_types::Configuration;
use dompatch_event_bus::{Diagnostic, DiagnosticSink, TracingSink};
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::datasource::{location_path, DataSource, DEFAULT_DATASOURCE};
use crate::errors::LoadError;

/// Where configurations come from.
///
/// Neither operation fails: a configuration that cannot be loaded is absent,
/// and the reason goes to the source's diagnostic sink.
#[async_trait]
pub trait ConfigurationSource: Send + Sync {
    /// Fetch and parse the configuration behind `identifier`.
    async fn load_configuration(&self, identifier: &str) -> Option<Configuration>;

    /// Identifiers of the configurations that apply to `location`.
    async fn resolve_configuration_identifiers(&self, location: &str) -> Vec<String>;
}

/// Identifier that is fetched over HTTP rather than read from disk
pub fn is_remote(identifier: &str) -> bool {
    identifier.starts_with("http://") || identifier.starts_with("https://")
}

/// Loads YAML (or JSON) documents from local files and HTTP URLs.
///
/// Relative identifiers resolve against the base directory, or against the
/// base URL when one is set.
pub struct FileSource {
    base_dir: PathBuf,
    base_url: Option<Url>,
    datasource: String,
    client: Client,
    sink: Arc<dyn DiagnosticSink>,
}

impl FileSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            base_url: None,
            datasource: DEFAULT_DATASOURCE.to_string(),
            client: Client::new(),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_datasource(mut self, identifier: impl Into<String>) -> Self {
        self.datasource = identifier.into();
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Rebuild the HTTP client with a request timeout
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LoadError::Client)?;
        Ok(self.with_client(client))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn datasource(&self) -> &str {
        &self.datasource
    }

    /// Raw text behind an identifier
    pub async fn fetch_text(&self, identifier: &str) -> Result<String, LoadError> {
        if is_remote(identifier) {
            return self.fetch_remote(identifier, identifier).await;
        }
        if let Some(base_url) = &self.base_url {
            let url = base_url
                .join(identifier)
                .map_err(|source| LoadError::InvalidUrl {
                    identifier: identifier.to_string(),
                    source,
                })?;
            return self.fetch_remote(identifier, url.as_str()).await;
        }

        let path = self.base_dir.join(identifier);
        debug!(identifier, path = %path.display(), "Reading configuration file");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Io {
                identifier: identifier.to_string(),
                source,
            })
    }

    async fn fetch_remote(&self, identifier: &str, url: &str) -> Result<String, LoadError> {
        debug!(identifier, url, "Fetching configuration");
        let http = |source| LoadError::Http {
            identifier: identifier.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                identifier: identifier.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(http)
    }

    /// Load and parse a configuration, keeping the failure reason
    pub async fn try_load_configuration(&self, identifier: &str) -> Result<Configuration, LoadError> {
        let text = self.fetch_text(identifier).await?;
        serde_yaml::from_str(&text).map_err(|source| LoadError::Parse {
            identifier: identifier.to_string(),
            source,
        })
    }

    /// Load and parse the datasource document
    pub async fn load_datasource(&self) -> Result<DataSource, LoadError> {
        let text = self.fetch_text(&self.datasource).await?;
        serde_yaml::from_str(&text).map_err(|source| LoadError::Parse {
            identifier: self.datasource.clone(),
            source,
        })
    }

    fn report(&self, err: &LoadError) {
        let source = err.identifier().unwrap_or_default();
        self.sink
            .emit(Diagnostic::load_error(source, err.to_string()));
    }
}

#[async_trait]
impl ConfigurationSource for FileSource {
    async fn load_configuration(&self, identifier: &str) -> Option<Configuration> {
        match self.try_load_configuration(identifier).await {
            Ok(config) => {
                info!(identifier, actions = config.actions.len(), "Loaded configuration");
                Some(config)
            }
            Err(err) => {
                self.report(&err);
                None
            }
        }
    }

    async fn resolve_configuration_identifiers(&self, location: &str) -> Vec<String> {
        let datasource = match self.load_datasource().await {
            Ok(datasource) => datasource,
            Err(err) => {
                self.report(&err);
                return Vec::new();
            }
        };
        let path = location_path(location);
        let identifiers = datasource.identifiers_for(&path);
        debug!(location, path = %path, count = identifiers.len(), "Resolved configuration identifiers");
        identifiers
    }
}

/// Fixed in-memory configurations and routes.
pub struct StaticSource {
    configurations: HashMap<String, Configuration>,
    routes: DataSource,
    sink: Arc<dyn DiagnosticSink>,
}

impl StaticSource {
    pub fn new(routes: DataSource) -> Self {
        Self {
            configurations: HashMap::new(),
            routes,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_configuration(mut self, identifier: impl Into<String>, config: Configuration) -> Self {
        self.configurations.insert(identifier.into(), config);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }
}

impl Default for StaticSource {
    fn default() -> Self {
        Self::new(DataSource::default())
    }
}

#[async_trait]
impl ConfigurationSource for StaticSource {
    async fn load_configuration(&self, identifier: &str) -> Option<Configuration> {
        let found = self.configurations.get(identifier).cloned();
        if found.is_none() {
            let err = LoadError::NotFound(identifier.to_string());
            self.sink
                .emit(Diagnostic::load_error(identifier, err.to_string()));
        }
        found
    }

    async fn resolve_configuration_identifiers(&self, location: &str) -> Vec<String> {
        self.routes.identifiers_for(&location_path(location))
    }
}
