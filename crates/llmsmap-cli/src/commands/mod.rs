//! Command implementations.
//!
//! Each module exposes an `execute` entry point called from [`crate::run`].

pub mod fetch;
pub mod generate;
pub mod init;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use llmsmap_core::SiteConfig;
use llmsmap_core::config::ENV_OUTPUT_DIR;

/// Settings needed to read an existing output directory.
///
/// Unlike generation these do not require a site URL, so only the fetch
/// endpoint section of the config file is validated.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    /// Generated output directory.
    pub output_dir: PathBuf,
    /// Fetch endpoint path.
    pub fetch_path: String,
    /// Whether fetch responses carry CORS headers.
    pub cors: bool,
}

impl OutputSettings {
    /// Resolve settings from `--output`, `LLMSMAP_OUTPUT_DIR` and the config file.
    pub fn load(config_path: Option<&Path>, output: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir()
                .ok()
                .and_then(|dir| SiteConfig::discover(&dir)),
        };
        let config = match path {
            Some(path) => SiteConfig::from_file(&path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => SiteConfig::default(),
        };
        config.fetch_endpoint.validate()?;

        let output_dir = output
            .map(Path::to_path_buf)
            .or_else(|| {
                std::env::var(ENV_OUTPUT_DIR)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or(config.output_dir);

        Ok(Self {
            output_dir,
            fetch_path: config.fetch_endpoint.path,
            cors: config.fetch_endpoint.cors,
        })
    }
}
