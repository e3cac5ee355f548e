use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Settings;

pub fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    // Logs go to stderr; stdout carries patched markup and listings.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

pub struct LoadedSettings {
    pub settings: Settings,
    pub path: PathBuf,
    pub found: bool,
}

impl LoadedSettings {
    /// Report where settings came from; called once logging is up
    pub fn log_origin(&self) {
        if self.found {
            info!("Loaded settings from: {}", self.path.display());
        } else {
            warn!("Settings file not found, using defaults: {}", self.path.display());
        }
    }
}

/// Default settings location: ./config/dompatch.yaml, then the user config dir
pub fn default_settings_path() -> Result<PathBuf> {
    let local = PathBuf::from("config/dompatch.yaml");
    if local.exists() {
        return Ok(local);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("dompatch");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_settings(settings_path: Option<&PathBuf>) -> Result<LoadedSettings> {
    let path = match settings_path {
        Some(path) => path.clone(),
        None => default_settings_path()?,
    };

    if path.exists() {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(LoadedSettings {
            settings,
            path,
            found: true,
        })
    } else {
        Ok(LoadedSettings {
            settings: Settings::default(),
            path,
            found: false,
        })
    }
}
