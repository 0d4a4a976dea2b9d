//! Logging initialization and configuration.
//!
//! This module handles setting up the tracing subscriber and color control
//! based on CLI flags and environment variables.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Commands, LogFormat};

/// Initialize the logging subsystem based on CLI flags.
///
/// Logs go to stderr so command output on stdout stays clean. Machine
/// readable output (`generate --json`, `fetch` bodies) also disables colors.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = log_level(cli);

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    match cli.log_format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    let env_no_color = std::env::var_os("NO_COLOR").is_some();
    if cli.no_color || env_no_color || machine_output(cli) {
        color_control::set_override(false);
    }
    Ok(())
}

fn log_level(cli: &Cli) -> Level {
    if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

fn machine_output(cli: &Cli) -> bool {
    match &cli.command {
        Commands::Generate(args) => args.json,
        Commands::Fetch(_) => true,
        Commands::Init(_) | Commands::Serve(_) => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(log_level(&parse(&["llmsmap", "serve"])), Level::WARN);
        assert_eq!(log_level(&parse(&["llmsmap", "-v", "serve"])), Level::DEBUG);
        assert_eq!(log_level(&parse(&["llmsmap", "-q", "serve"])), Level::ERROR);
    }

    #[test]
    fn test_machine_output_detection() {
        assert!(machine_output(&parse(&["llmsmap", "generate", "--json"])));
        assert!(!machine_output(&parse(&["llmsmap", "generate"])));
        assert!(machine_output(&parse(&["llmsmap", "fetch", "search=x"])));
    }
}
