//! # CLI Structure and Argument Parsing
//!
//! The command-line interface for `llmsmap`, built with `clap` derive macros.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Write a starter llmsmap.toml
//! llmsmap init --url https://example.com
//!
//! # Crawl and generate (or replay saved pages)
//! llmsmap generate --key fc-...
//! llmsmap generate --pages pages.json
//!
//! # Serve the output directory locally
//! llmsmap serve --port 3456
//!
//! # Run one fetch request against the output directory
//! llmsmap fetch "sections=/docs/*&format=json"
//! ```
//!
//! ## Global Options
//!
//! - `--verbose` / `--quiet`: log level (`DEBUG` / `ERROR`, default `WARN`)
//! - `--log-format json`: structured logs on stderr
//! - `--no-color`: plain summaries (also honoured via `NO_COLOR`)
//! - `--config`: explicit config file (default `./llmsmap.toml`)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default port for `llmsmap serve`.
pub const DEFAULT_PORT: u16 = 3456;

/// Main CLI structure for the `llmsmap` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "llmsmap")]
#[command(version)]
#[command(
    about = "llmsmap - Composable-context site maps for LLM agents",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Path to the config file
    #[arg(long, global = true, env = "LLMSMAP_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Log formatter selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Available subcommands.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Write a starter llmsmap.toml
    Init(InitArgs),

    /// Crawl the site and generate llmsmap.txt, manifest.json and content files
    Generate(GenerateArgs),

    /// Serve a generated output directory over HTTP
    Serve(ServeArgs),

    /// Run one fetch request against a generated output directory
    Fetch(FetchArgs),
}

/// Arguments for `llmsmap init`.
#[derive(Args, Clone, Debug)]
pub struct InitArgs {
    /// Site URL to map
    #[arg(long)]
    pub url: String,

    /// Firecrawl API key to store in the config
    #[arg(long)]
    pub key: Option<String>,

    /// Overwrite an existing config file
    #[arg(short = 'f', long)]
    pub force: bool,
}

/// Arguments for `llmsmap generate`.
#[derive(Args, Clone, Debug, Default)]
pub struct GenerateArgs {
    /// Site URL (overrides config and LLMSMAP_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Firecrawl API key (overrides config and FIRECRAWL_API_KEY)
    #[arg(long)]
    pub key: Option<String>,

    /// Output directory
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Path globs to include (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Path globs to exclude (repeatable; replaces the configured list)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Maximum pages to crawl
    #[arg(long, value_name = "N")]
    pub max_pages: Option<usize>,

    /// Read scraped pages from a JSON or JSON-lines file instead of crawling
    #[arg(long, value_name = "FILE")]
    pub pages: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `llmsmap serve`.
#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Output directory to serve
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Port to listen on
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

/// Arguments for `llmsmap fetch`.
#[derive(Args, Clone, Debug)]
pub struct FetchArgs {
    /// Query string, e.g. `sections=/docs/*&format=json`
    pub query: String,

    /// Output directory to read
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Print a one-line-per-section summary instead of the body
    #[arg(long)]
    pub summary: bool,
}
