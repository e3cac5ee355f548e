use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

/// dompatch - apply declarative DOM patches to HTML pages
#[derive(Parser)]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Settings file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub settings: Option<PathBuf>,

    /// Log level (defaults to the settings file, then "info")
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format for reports and listings
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    pub format: crate::cli::output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}
