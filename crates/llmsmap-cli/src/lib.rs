//! llmsmap CLI - composable-context site maps for LLM agents
//!
//! Parses arguments, installs logging and dispatches to the command
//! modules.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod server;
mod utils;

use crate::utils::initialize_logging;
use cli::{Cli, Commands};

/// Execute the llmsmap CLI with the current process arguments.
///
/// # Errors
///
/// Returns an error if logging cannot be initialized or the command fails.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(&cli)?;

    let config = cli.config.as_deref();
    match &cli.command {
        Commands::Init(args) => {
            commands::init::execute(config, &args.url, args.key.as_deref(), args.force, cli.quiet)
        },
        Commands::Generate(args) => commands::generate::execute(config, args, cli.quiet).await,
        Commands::Serve(args) => commands::serve::execute(config, args, cli.quiet).await,
        Commands::Fetch(args) => commands::fetch::execute(
            config,
            args.output.as_deref(),
            &args.query,
            args.summary,
        ),
    }
}
