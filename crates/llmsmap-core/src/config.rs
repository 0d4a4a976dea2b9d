//! Configuration management for llmsmap generation runs.
//!
//! Settings are stored in TOML (`llmsmap.toml`) and merged with environment
//! variables and command-line overrides.
//!
//! ## Precedence
//!
//! 1. **Command-line flags** ([`ConfigOverrides`])
//! 2. **Environment variables**: `LLMSMAP_URL`, `LLMSMAP_OUTPUT_DIR`, `FIRECRAWL_API_KEY`
//! 3. **Config file**: `./llmsmap.toml` or an explicit path
//! 4. **Defaults**
//!
//! ## Example Configuration File
//!
//! ```toml
//! url = "https://docs.example.com"
//! output_dir = ".llmsmap"
//! exclude = ["/admin/*", "/api/*"]
//! max_pages = 200
//!
//! [fetch_endpoint]
//! path = "/llms/fetch"
//! cors = true
//! ```
//!
//! ## Resolving
//!
//! ```rust
//! use llmsmap_core::config::{ConfigOverrides, SiteConfig};
//!
//! let overrides = ConfigOverrides {
//!     url: Some("https://docs.example.com/".to_string()),
//!     ..ConfigOverrides::default()
//! };
//! let config = SiteConfig::resolve(None, |_| None, &overrides)?;
//!
//! assert_eq!(config.max_pages, 500);
//! assert_eq!(config.fetch_endpoint_url(), "https://docs.example.com/llms/fetch");
//! # Ok::<(), llmsmap_core::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "llmsmap.toml";

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = ".llmsmap";

/// Default fetch endpoint path.
pub const DEFAULT_FETCH_PATH: &str = "/llms/fetch";

/// Default crawl page limit.
pub const DEFAULT_MAX_PAGES: usize = 500;

/// Default crawl depth.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Paths excluded from crawling unless configured otherwise.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "/admin/*",
    "/api/*",
    "/login*",
    "/sitemap.xml",
    "/atom",
    "/feed",
    "/rss",
];

/// Environment variable for the site URL.
pub const ENV_URL: &str = "LLMSMAP_URL";
/// Environment variable for the output directory.
pub const ENV_OUTPUT_DIR: &str = "LLMSMAP_OUTPUT_DIR";
/// Environment variable for the Firecrawl API key.
pub const ENV_API_KEY: &str = "FIRECRAWL_API_KEY";

/// Fetch endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchEndpointConfig {
    /// Path the fetch handler is mounted at.
    pub path: String,
    /// Whether responses carry permissive CORS headers.
    pub cors: bool,
}

impl FetchEndpointConfig {
    /// Check that the endpoint path is absolute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the path does not start with `/`.
    pub fn validate(&self) -> Result<()> {
        if self.path.starts_with('/') {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "fetch_endpoint.path must start with '/', got '{}'",
                self.path
            )))
        }
    }
}

impl Default for FetchEndpointConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_FETCH_PATH.to_string(),
            cors: true,
        }
    }
}

/// Settings for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute http(s) URL of the site root.
    pub url: String,
    /// Directory the generated files are written to.
    pub output_dir: PathBuf,
    /// Firecrawl API key; only needed when crawling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firecrawl_api_key: Option<String>,
    /// Path globs to include; empty means everything.
    pub include: Vec<String>,
    /// Path globs to exclude.
    pub exclude: Vec<String>,
    /// Maximum pages to crawl.
    pub max_pages: usize,
    /// Maximum link depth to crawl.
    pub max_depth: usize,
    /// Site name override; defaults to the root page title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Site description override; defaults to the root page description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_description: Option<String>,
    /// Fetch endpoint settings.
    pub fetch_endpoint: FetchEndpointConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            firecrawl_api_key: None,
            include: Vec::new(),
            exclude: DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect(),
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            site_name: None,
            site_description: None,
            fetch_endpoint: FetchEndpointConfig::default(),
        }
    }
}

/// Values supplied on the command line; `None` leaves lower layers intact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// `--url`
    pub url: Option<String>,
    /// `--key`
    pub api_key: Option<String>,
    /// `--output`
    pub output_dir: Option<PathBuf>,
    /// `--include`
    pub include: Option<Vec<String>>,
    /// `--exclude`
    pub exclude: Option<Vec<String>>,
    /// `--max-pages`
    pub max_pages: Option<usize>,
}

impl SiteConfig {
    /// Load configuration from the given file (or `./llmsmap.toml` when
    /// present), layering process environment and `overrides` on top.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit config file cannot be read or parsed
    /// - The merged configuration fails [`validate`](Self::validate)
    pub fn load(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir().ok().and_then(|dir| Self::discover(&dir)),
        };

        let file = path.as_deref().map(Self::from_file).transpose()?;
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Merge a parsed file, an environment lookup and overrides, then validate.
    ///
    /// The environment is passed as a lookup function so callers and tests
    /// control which variables are visible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] or [`Error::InvalidUrl`] if the merged
    /// configuration is invalid.
    pub fn resolve<F>(file: Option<Self>, env: F, overrides: &ConfigOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = file.unwrap_or_default();

        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = env(ENV_URL) {
            config.url = url;
        }
        if let Some(dir) = env(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(key) = env(ENV_API_KEY) {
            config.firecrawl_api_key = Some(key);
        }

        if let Some(url) = &overrides.url {
            config.url.clone_from(url);
        }
        if let Some(key) = &overrides.api_key {
            config.firecrawl_api_key = Some(key.clone());
        }
        if let Some(dir) = &overrides.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(include) = &overrides.include {
            config.include.clone_from(include);
        }
        if let Some(exclude) = &overrides.exclude {
            config.exclude.clone_from(exclude);
        }
        if let Some(max) = overrides.max_pages {
            config.max_pages = max;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))
    }

    /// Find `llmsmap.toml` in `dir`.
    #[must_use]
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        candidate.is_file().then_some(candidate)
    }

    /// Check required fields and value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for an unparsable or non-http(s) URL,
    /// and [`Error::Config`] for a missing URL, a zero page limit or a
    /// relative fetch endpoint path.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Config(format!(
                "site URL is required (use --url, {ENV_URL} or `url` in {CONFIG_FILE_NAME})"
            )));
        }
        let parsed = Url::parse(&self.url)
            .map_err(|e| Error::InvalidUrl(format!("site URL '{}': {e}", self.url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "site URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.max_pages == 0 {
            return Err(Error::Config("max_pages must be greater than 0".into()));
        }
        self.fetch_endpoint.validate()
    }

    /// Write the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Site URL without a trailing slash.
    #[must_use]
    pub fn site_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Absolute URL of the fetch endpoint.
    #[must_use]
    pub fn fetch_endpoint_url(&self) -> String {
        format!("{}{}", self.site_url(), self.fetch_endpoint.path)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn with_url(url: &str) -> ConfigOverrides {
        ConfigOverrides {
            url: Some(url.to_string()),
            ..ConfigOverrides::default()
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_values() {
        let config = SiteConfig::default();

        assert_eq!(config.output_dir, PathBuf::from(".llmsmap"));
        assert_eq!(config.max_pages, 500);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.fetch_endpoint.path, "/llms/fetch");
        assert!(config.fetch_endpoint.cors);
        assert!(config.include.is_empty());
        assert_eq!(config.exclude.len(), 7);
        assert!(config.exclude.contains(&"/login*".to_string()));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let result = SiteConfig::resolve(None, |_| None, &ConfigOverrides::default());

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("site URL is required")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_http_url_is_rejected() {
        let err = SiteConfig::resolve(None, |_| None, &with_url("ftp://example.com")).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)), "got {err:?}");
        assert!(err.to_string().contains("http or https"));

        let err = SiteConfig::resolve(None, |_| None, &with_url("not a url")).unwrap_err();
        assert_eq!(err.category(), "invalid_url");
        assert!(err.to_string().contains("Invalid URL: site URL 'not a url'"));
    }

    #[test]
    fn test_relative_fetch_path_is_rejected() {
        let endpoint = FetchEndpointConfig {
            path: "llms/fetch".to_string(),
            cors: true,
        };
        match endpoint.validate() {
            Err(Error::Config(msg)) => assert!(msg.contains("must start with '/'")),
            other => panic!("Expected Config error, got {other:?}"),
        }

        let config = SiteConfig {
            url: "https://example.com".to_string(),
            fetch_endpoint: endpoint,
            ..SiteConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().category(), "config");
    }

    #[test]
    fn test_zero_max_pages_is_rejected() {
        let overrides = ConfigOverrides {
            max_pages: Some(0),
            ..with_url("https://example.com")
        };
        let err = SiteConfig::resolve(None, |_| None, &overrides).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_precedence_flags_over_env_over_file() {
        // Given: A file, environment and flags all setting the URL
        let file = SiteConfig {
            url: "https://file.example.com".to_string(),
            output_dir: PathBuf::from("from-file"),
            max_pages: 42,
            ..SiteConfig::default()
        };
        let env = env_of(&[
            (ENV_URL, "https://env.example.com"),
            (ENV_API_KEY, "fc-env"),
        ]);

        // When: Resolving without a URL flag
        let config = SiteConfig::resolve(Some(file.clone()), &env, &ConfigOverrides::default())
            .expect("valid config");

        // Then: Env beats file, untouched file values survive
        assert_eq!(config.url, "https://env.example.com");
        assert_eq!(config.firecrawl_api_key.as_deref(), Some("fc-env"));
        assert_eq!(config.output_dir, PathBuf::from("from-file"));
        assert_eq!(config.max_pages, 42);

        // When: A flag is also present
        let config = SiteConfig::resolve(Some(file), &env, &with_url("https://flag.example.com"))
            .expect("valid config");

        // Then: The flag wins
        assert_eq!(config.url, "https://flag.example.com");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let env = env_of(&[(ENV_OUTPUT_DIR, "  ")]);
        let config = SiteConfig::resolve(None, env, &with_url("https://example.com")).unwrap();
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_list_overrides_replace_file_lists() {
        let overrides = ConfigOverrides {
            include: Some(vec!["/docs/*".to_string()]),
            exclude: Some(vec![]),
            ..with_url("https://example.com")
        };
        let config = SiteConfig::resolve(None, |_| None, &overrides).unwrap();

        assert_eq!(config.include, vec!["/docs/*"]);
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn test_fetch_endpoint_url_trims_trailing_slash() {
        let config = SiteConfig::resolve(None, |_| None, &with_url("https://example.com/")).unwrap();
        assert_eq!(config.site_url(), "https://example.com");
        assert_eq!(config.fetch_endpoint_url(), "https://example.com/llms/fetch");
    }

    #[test]
    fn test_config_save_and_load_roundtrip() -> Result<()> {
        // Given: A temporary directory and a configured site
        let temp_dir = TempDir::new().map_err(|e| Error::Config(e.to_string()))?;
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);
        let original = SiteConfig {
            url: "https://docs.example.com".to_string(),
            site_name: Some("Example Docs".to_string()),
            include: vec!["/docs/*".to_string()],
            fetch_endpoint: FetchEndpointConfig {
                path: "/api/context".to_string(),
                cors: false,
            },
            ..SiteConfig::default()
        };

        // When: Saving then loading
        original.save(&path)?;
        let loaded = SiteConfig::from_file(&path)?;

        // Then: Configurations should be identical
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "url = \"https://example.com\"\n[fetch_endpoint]\ncors = false\n").unwrap();

        let config = SiteConfig::from_file(&path).unwrap();

        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.fetch_endpoint.path, DEFAULT_FETCH_PATH);
        assert!(!config.fetch_endpoint.cors);
    }

    #[test]
    fn test_config_parse_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "this is not valid toml [[[").unwrap();

        match SiteConfig::from_file(&path) {
            Err(Error::Config(msg)) => assert!(msg.contains("Failed to parse config")),
            other => panic!("Expected Config parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_with_missing_explicit_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");

        let err = SiteConfig::load(Some(&missing), &with_url("https://example.com")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_discover_finds_config_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(SiteConfig::discover(temp_dir.path()).is_none());

        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        assert_eq!(
            SiteConfig::discover(temp_dir.path()),
            Some(temp_dir.path().join(CONFIG_FILE_NAME))
        );
    }

    proptest! {
        #[test]
        fn test_config_max_pages_roundtrip(max_pages in 1usize..=100_000) {
            let config = SiteConfig {
                url: "https://example.com".to_string(),
                max_pages,
                ..SiteConfig::default()
            };
            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: SiteConfig = toml::from_str(&toml).unwrap();
            prop_assert_eq!(parsed.max_pages, max_pages);
            prop_assert!(parsed.validate().is_ok());
        }
    }
}
