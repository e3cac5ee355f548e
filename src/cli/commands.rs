use clap::Subcommand;

use super::check::CheckArgs;
use super::patch::PatchArgs;
use super::resolve::ResolveArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Apply the configurations for a page to an HTML file
    Patch(PatchArgs),

    /// List the configuration identifiers registered for a location
    Resolve(ResolveArgs),

    /// Load configurations and print the actions in dispatch order
    Check(CheckArgs),
}
