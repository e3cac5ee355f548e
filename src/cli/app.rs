use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_settings, LoadedSettings};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    let loaded = load_settings(cli.settings.as_ref()).await?;
    let level = cli
        .log_level
        .clone()
        .or_else(|| loaded.settings.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level, cli.debug, cli.log_json)?;

    info!("Starting dompatch v{}", env!("CARGO_PKG_VERSION"));
    loaded.log_origin();

    let LoadedSettings { mut settings, path, .. } = loaded;
    settings.apply_env_overrides();
    let ctx = CliContext::new(settings, path, cli.format);

    match dispatch(&cli, &ctx).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
