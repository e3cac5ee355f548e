use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use super::context::CliContext;
use action_flow::{merge, plan, PlannedStep};
use dompatch_config_source::{load_all, ConfigurationSource};
use dompatch_event_bus::Diagnostic;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Configuration identifiers (files or URLs), merged in the order given
    #[arg(short, long = "config", value_name = "ID", required_unless_present = "location")]
    pub configs: Vec<String>,

    /// Resolve identifiers for this location instead of listing them
    #[arg(long, conflicts_with = "configs")]
    pub location: Option<String>,

    /// Datasource identifier (overrides settings)
    #[arg(long, value_name = "FILE")]
    pub datasource: Option<String>,

    /// Succeed even if some configurations failed to load
    #[arg(long)]
    pub allow_missing: bool,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    identifiers: &'a [String],
    failed: Vec<&'a str>,
    steps: Vec<PlannedStep<'a>>,
    diagnostics: Vec<Diagnostic>,
}

pub async fn cmd_check(args: CheckArgs, ctx: &CliContext) -> Result<()> {
    let (sink, memory) = ctx.sinks();
    let source = ctx.file_source(args.datasource.as_deref(), sink)?;

    let identifiers = match &args.location {
        Some(location) => source.resolve_configuration_identifiers(location).await,
        None => args.configs.clone(),
    };
    let loaded = load_all(&source, &identifiers).await;
    let failed: Vec<&str> = identifiers
        .iter()
        .zip(&loaded)
        .filter(|(_, config)| config.is_none())
        .map(|(identifier, _)| identifier.as_str())
        .collect();
    let merged = merge(loaded);

    let report = CheckReport {
        identifiers: &identifiers,
        failed,
        steps: plan(&merged),
        diagnostics: memory.entries(),
    };

    match ctx.format().render(&report)? {
        Some(rendered) => println!("{}", rendered),
        None => print_human(&report),
    }

    if report.steps.is_empty() {
        bail!("invalid or empty configuration, nothing to apply");
    }
    if !report.failed.is_empty() && !args.allow_missing {
        bail!(
            "{} of {} configurations failed to load",
            report.failed.len(),
            identifiers.len()
        );
    }
    Ok(())
}

fn print_human(report: &CheckReport<'_>) {
    println!(
        "{} actions from {} configurations",
        report.steps.len(),
        report.identifiers.len() - report.failed.len()
    );
    for identifier in &report.failed {
        println!("  ! failed to load {}", identifier);
    }
    for (index, step) in report.steps.iter().enumerate() {
        let marker = if step.action.kind().is_known() {
            ""
        } else {
            " (unsupported type)"
        };
        println!(
            "{:>4}. priority {:<4} {:<8} {}{}",
            index + 1,
            step.priority,
            step.action.kind().name(),
            step.action,
            marker
        );
    }
}
