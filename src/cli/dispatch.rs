use super::check::cmd_check;
use super::env::CliArgs;
use super::patch::cmd_patch;
use super::resolve::cmd_resolve;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Patch(args) => cmd_patch(args, ctx).await,
        Commands::Resolve(args) => cmd_resolve(args, ctx).await,
        Commands::Check(args) => cmd_check(args, ctx).await,
    }
}
