//! Runtime settings
//!
//! Loaded from YAML by [`crate::cli::runtime::load_settings`]; every field has
//! a default so a missing or partial file is fine.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dompatch_config_source::DEFAULT_DATASOURCE;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Overrides [`Settings::datasource`]
pub const DATASOURCE_ENV: &str = "DOMPATCH_DATASOURCE";
/// Overrides [`Settings::base_url`]
pub const BASE_URL_ENV: &str = "DOMPATCH_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identifier of the datasource document
    pub datasource: String,

    /// Directory relative identifiers resolve against
    pub base_dir: PathBuf,

    /// When set, relative identifiers are fetched from this URL instead of disk
    pub base_url: Option<String>,

    /// Log level used when `--log-level` is not given
    pub log_level: Option<String>,

    /// Request timeout for remote identifiers
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            datasource: DEFAULT_DATASOURCE.to_string(),
            base_dir: PathBuf::from("."),
            base_url: None,
            log_level: None,
            http_timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Apply `DOMPATCH_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(datasource) = env::var(DATASOURCE_ENV) {
            if !datasource.trim().is_empty() {
                info!("Using datasource from {}: {}", DATASOURCE_ENV, datasource);
                self.datasource = datasource;
            }
        }
        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                info!("Using base URL from {}: {}", BASE_URL_ENV, base_url);
                self.base_url = Some(base_url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings: Settings = serde_yaml::from_str("http_timeout_secs: 3\n").unwrap();
        assert_eq!(settings.http_timeout_secs, 3);
        assert_eq!(settings.datasource, DEFAULT_DATASOURCE);
        assert_eq!(settings.base_dir, PathBuf::from("."));
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let settings = Settings {
            http_timeout_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.http_timeout(), Duration::from_secs(1));
    }

    #[test]
    #[serial]
    fn env_overrides_datasource() {
        env::set_var(DATASOURCE_ENV, "routes/site.yaml");
        let mut settings = Settings::default();
        settings.apply_env_overrides();
        env::remove_var(DATASOURCE_ENV);

        assert_eq!(settings.datasource, "routes/site.yaml");
    }

    #[test]
    #[serial]
    fn blank_env_is_ignored() {
        env::set_var(DATASOURCE_ENV, "  ");
        let mut settings = Settings::default();
        settings.apply_env_overrides();
        env::remove_var(DATASOURCE_ENV);

        assert_eq!(settings.datasource, DEFAULT_DATASOURCE);
    }
}
