use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::info;

use super::context::CliContext;
use crate::pipeline::Patcher;
use action_flow::ApplyReport;
use dompatch_event_bus::Diagnostic;

#[derive(Args, Clone, Debug)]
pub struct PatchArgs {
    /// HTML file to patch ("-" reads stdin)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Page location used to look up configurations in the datasource
    #[arg(long, required_unless_present = "configs")]
    pub location: Option<String>,

    /// Datasource identifier (overrides settings)
    #[arg(long, value_name = "FILE")]
    pub datasource: Option<String>,

    /// Use these configuration identifiers instead of the datasource
    #[arg(short, long = "config", value_name = "ID")]
    pub configs: Vec<String>,

    /// Write patched HTML here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the apply report (JSON) to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Exit with an error if anything failed to apply
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct PatchReport<'a> {
    location: Option<&'a str>,
    identifiers: &'a [String],
    #[serde(flatten)]
    apply: &'a ApplyReport,
    diagnostics: Vec<Diagnostic>,
}

pub async fn cmd_patch(args: PatchArgs, ctx: &CliContext) -> Result<()> {
    let (sink, memory) = ctx.sinks();
    let source = ctx.file_source(args.datasource.as_deref(), sink.clone())?;
    let patcher = Patcher::new(Arc::new(source), sink);

    let identifiers = if args.configs.is_empty() {
        match &args.location {
            Some(location) => patcher.resolve(location).await,
            None => bail!("either --location or --config is required"),
        }
    } else {
        args.configs.clone()
    };
    info!(configurations = identifiers.len(), "Resolved configurations");

    let html = read_input(&args.input).await?;
    let outcome = patcher.patch_with(&html, &identifiers).await;

    match &args.output {
        Some(path) => {
            fs::write(path, &outcome.html)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote patched HTML to {}", path.display());
        }
        None => print!("{}", outcome.html),
    }

    let report = PatchReport {
        location: args.location.as_deref(),
        identifiers: &identifiers,
        apply: &outcome.report,
        diagnostics: memory.entries(),
    };
    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }
    match ctx.format().render(&report)? {
        Some(rendered) => eprintln!("{}", rendered),
        None => eprintln!(
            "applied {}/{} actions ({} mutations, {} failed, {} unsupported) in {}ms",
            outcome.report.applied(),
            outcome.report.total(),
            outcome.report.mutations(),
            outcome.report.failed(),
            outcome.report.unrecognized(),
            outcome.report.latency_ms
        ),
    }

    if args.strict {
        outcome.report.ensure_success(false)?;
    }
    Ok(())
}

async fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut html = String::new();
        tokio::io::stdin()
            .read_to_string(&mut html)
            .await
            .context("Failed to read stdin")?;
        return Ok(html);
    }
    fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
