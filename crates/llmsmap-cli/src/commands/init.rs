//! Init command implementation

use std::path::Path;

use anyhow::{Result, bail};
use colored::Colorize;
use llmsmap_core::SiteConfig;
use llmsmap_core::config::CONFIG_FILE_NAME;

/// Write a starter config file.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn execute(
    config_path: Option<&Path>,
    url: &str,
    key: Option<&str>,
    force: bool,
    quiet: bool,
) -> Result<()> {
    let path = config_path.map_or_else(|| Path::new(CONFIG_FILE_NAME).to_path_buf(), Path::to_path_buf);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let config = SiteConfig {
        url: url.to_string(),
        firecrawl_api_key: key.map(ToString::to_string),
        ..SiteConfig::default()
    };
    config.validate()?;
    config.save(&path)?;

    if !quiet {
        println!("{} {}", "✓ Created".green(), path.display());
        if key.is_none() {
            println!(
                "  Set {} or pass --key before running {}",
                "FIRECRAWL_API_KEY".bold(),
                "llmsmap generate".bold()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_loadable_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("llmsmap.toml");

        execute(Some(&path), "https://example.com", Some("fc-1"), false, true).unwrap();

        let config = SiteConfig::from_file(&path).unwrap();
        assert_eq!(config.url, "https://example.com");
        assert_eq!(config.firecrawl_api_key.as_deref(), Some("fc-1"));
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("llmsmap.toml");
        std::fs::write(&path, "url = \"https://old.example\"\n").unwrap();

        let err = execute(Some(&path), "https://example.com", None, false, true).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        execute(Some(&path), "https://example.com", None, true, true).unwrap();
        assert_eq!(
            SiteConfig::from_file(&path).unwrap().url,
            "https://example.com"
        );
    }

    #[test]
    fn test_rejects_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("llmsmap.toml");

        assert!(execute(Some(&path), "ftp://example.com", None, false, true).is_err());
        assert!(!path.exists());
    }
}
