//! Serve command implementation

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use llmsmap_core::generate::MANIFEST_FILE;
use tracing::{info, warn};

use super::OutputSettings;
use crate::cli::ServeArgs;
use crate::server::Server;

/// Serve the output directory until interrupted.
pub async fn execute(config_path: Option<&Path>, args: &ServeArgs, quiet: bool) -> Result<()> {
    let settings = OutputSettings::load(config_path, args.output.as_deref())?;
    if !settings.output_dir.join(MANIFEST_FILE).is_file() {
        warn!(
            dir = %settings.output_dir.display(),
            "No manifest found; run `llmsmap generate` first"
        );
    }

    let ip: IpAddr = args
        .host
        .parse()
        .with_context(|| format!("invalid host address '{}'", args.host))?;
    let server = Server::start(SocketAddr::new(ip, args.port), &settings).await?;
    let base = format!("http://{}", server.addr());
    info!(addr = %server.addr(), dir = %settings.output_dir.display(), "Serving");

    if !quiet {
        println!("{} {}", "✓ Serving".green(), settings.output_dir.display());
        println!("  Index:    {base}/llmsmap.txt");
        println!("  Manifest: {base}/{MANIFEST_FILE}");
        println!("  Fetch:    {base}{}?sections=/", settings.fetch_path);
        println!("  Press Ctrl+C to stop");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    server.shutdown().await;
    Ok(())
}
