//! Main entry point for the higan-pack CLI

mod cli;
mod commands;
mod utils;

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use std::io;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logger; -v/-q override RUST_LOG
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    let level = match (cli.verbose, cli.quiet) {
        (0, false) => None,
        (0, true) => Some(log::LevelFilter::Error),
        (1, _) => Some(log::LevelFilter::Info),
        (2, _) => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    };
    if let Some(level) = level {
        logger.filter_level(level);
    }
    logger.init();

    let password = cli.password.as_deref();

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::patch::build(args, password),
        Commands::List(args) => commands::patch::list(args, password),
        Commands::Extract(args) => commands::patch::extract(args, password),
        Commands::Info(args) => commands::patch::info(args, password),
        Commands::Verify(args) => commands::patch::verify(args, password),
        Commands::Package(args) => commands::package::execute(args, password),
        Commands::Resolve(args) => commands::resolve::execute(args, password),

        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
