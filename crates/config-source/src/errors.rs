//! Error types for configuration loading

use thiserror::Error;

/// Why a configuration or datasource document could not be loaded.
///
/// Never crosses the [`ConfigurationSource`](crate::ConfigurationSource)
/// boundary: sources turn it into a diagnostic and an absent result.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {identifier}: {source}")]
    Io {
        identifier: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {identifier}: {source}")]
    Http {
        identifier: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {identifier}: HTTP {status}")]
    Status { identifier: String, status: u16 },

    #[error("failed to parse {identifier}: {source}")]
    Parse {
        identifier: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid URL for {identifier}: {source}")]
    InvalidUrl {
        identifier: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no configuration registered for {0}")]
    NotFound(String),

    #[error("failed to configure HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl LoadError {
    /// The identifier the failure is about, if any
    pub fn identifier(&self) -> Option<&str> {
        match self {
            LoadError::Io { identifier, .. }
            | LoadError::Http { identifier, .. }
            | LoadError::Status { identifier, .. }
            | LoadError::Parse { identifier, .. }
            | LoadError::InvalidUrl { identifier, .. } => Some(identifier),
            LoadError::NotFound(identifier) => Some(identifier),
            LoadError::Client(_) => None,
        }
    }
}
