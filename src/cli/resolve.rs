use anyhow::Result;
use clap::Args;

use super::context::CliContext;
use dompatch_config_source::ConfigurationSource;

#[derive(Args, Clone, Debug)]
pub struct ResolveArgs {
    /// Page location: a path such as /products, or a full URL
    #[arg(long)]
    pub location: String,

    /// Datasource identifier (overrides settings)
    #[arg(long, value_name = "FILE")]
    pub datasource: Option<String>,
}

pub async fn cmd_resolve(args: ResolveArgs, ctx: &CliContext) -> Result<()> {
    let (sink, _) = ctx.sinks();
    let source = ctx.file_source(args.datasource.as_deref(), sink)?;
    let identifiers = source
        .resolve_configuration_identifiers(&args.location)
        .await;

    match ctx.format().render(&identifiers)? {
        Some(rendered) => println!("{}", rendered),
        None if identifiers.is_empty() => {
            eprintln!("No configurations registered for {}", args.location);
        }
        None => {
            for identifier in &identifiers {
                println!("{}", identifier);
            }
        }
    }
    Ok(())
}
