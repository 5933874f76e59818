//! Root CLI structure for higan-pack

use clap::{Parser, Subcommand};

use crate::commands::package::PackageArgs;
use crate::commands::patch::{BuildArgs, ExtractArgs, InfoArgs, ListArgs, VerifyArgs};
use crate::commands::resolve::ResolveArgs;

#[derive(Parser)]
#[command(name = "higan-pack")]
#[command(about = "Build, inspect and resolve HiganVN patch archives", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Password for protected patches
    #[arg(short, long, global = true, env = "HGPK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a directory into a patch archive
    Build(BuildArgs),

    /// List files in a patch archive
    List(ListArgs),

    /// Extract files from a patch archive
    Extract(ExtractArgs),

    /// Show information about a patch archive
    Info(InfoArgs),

    /// Verify every entry of a patch archive
    Verify(VerifyArgs),

    /// Package a whole project into the standard patch set
    Package(PackageArgs),

    /// Show how a script reference resolves
    Resolve(ResolveArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
