//! Writes a generation run to the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::manifest::{CONTENT_DIR, Manifest, SiteInfo};
use crate::config::SiteConfig;
use crate::indexer::{RenderOptions, aggregate, build_tree, render_index};
use crate::page::PageRecord;
use crate::{Error, Result};

/// Index document file name.
pub const INDEX_FILE: &str = "llmsmap.txt";

/// Manifest document file name.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Summary of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStats {
    /// Bytes written to `llmsmap.txt`.
    pub index_size: usize,
    /// Bytes written to `manifest.json`.
    pub manifest_size: usize,
    /// Content files written.
    pub content_files: usize,
    /// Aggregated token count of the site.
    pub total_tokens: u64,
    /// Content-bearing pages in the manifest.
    pub total_pages: usize,
}

/// Runs the generation pipeline into one output directory.
///
/// ```text
/// <output>/
/// ├── llmsmap.txt
/// ├── manifest.json
/// └── content/
///     ├── _root.md
///     └── docs/intro.md
/// ```
#[derive(Debug, Clone)]
pub struct Generator {
    output_dir: PathBuf,
    site_url: String,
    site_name: Option<String>,
    site_description: Option<String>,
    fetch_path: String,
}

impl Generator {
    /// Create a generator writing to `output_dir` for the site at `site_url`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, site_url: impl Into<String>) -> Self {
        let site_url: String = site_url.into();
        Self {
            output_dir: output_dir.into(),
            site_url: site_url.trim_end_matches('/').to_string(),
            site_name: None,
            site_description: None,
            fetch_path: crate::config::DEFAULT_FETCH_PATH.to_string(),
        }
    }

    /// Create a generator from resolved configuration.
    #[must_use]
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            site_url: config.site_url().to_string(),
            site_name: config.site_name.clone(),
            site_description: config.site_description.clone(),
            fetch_path: config.fetch_endpoint.path.clone(),
        }
    }

    /// Override the site name taken from the root page.
    #[must_use]
    pub fn with_site_name(mut self, name: Option<String>) -> Self {
        self.site_name = name;
        self
    }

    /// Override the site description taken from the root page.
    #[must_use]
    pub fn with_site_description(mut self, description: Option<String>) -> Self {
        self.site_description = description;
        self
    }

    /// Set the fetch endpoint path.
    #[must_use]
    pub fn with_fetch_path(mut self, path: impl Into<String>) -> Self {
        self.fetch_path = path.into();
        self
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build the tree, then write content files, the manifest and the index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if any file cannot be written and
    /// [`Error::Serialization`] if the manifest cannot be encoded.
    pub fn run(&self, records: &[PageRecord]) -> Result<GenerateStats> {
        fs::create_dir_all(&self.output_dir)?;

        let tree = aggregate(build_tree(records));
        debug!(nodes = tree.iter().count(), "Built site tree");

        let content_files = self.write_content(records)?;

        let site = SiteInfo {
            name: self.site_name.clone().unwrap_or_else(|| tree.title.clone()),
            url: self.site_url.clone(),
            description: self
                .site_description
                .clone()
                .unwrap_or_else(|| tree.description.clone()),
        };

        let manifest = Manifest::from_tree(&tree, site.clone(), &self.fetch_path);
        let manifest_json = manifest.to_json_pretty()?;
        write_atomic(&self.output_dir.join(MANIFEST_FILE), &manifest_json)?;

        let rendered = render_index(
            &tree,
            &RenderOptions {
                site_name: Some(site.name),
                site_description: Some(site.description),
                fetch_endpoint: Some(format!("{}{}", self.site_url, self.fetch_path)),
                site_url: Some(self.site_url.clone()),
            },
        );
        write_atomic(&self.output_dir.join(INDEX_FILE), &rendered.content)?;

        let stats = GenerateStats {
            index_size: rendered.byte_len(),
            manifest_size: manifest_json.len(),
            content_files,
            total_tokens: manifest.total_tokens,
            total_pages: manifest.total_pages,
        };

        info!(
            pages = stats.total_pages,
            tokens = stats.total_tokens,
            output = %self.output_dir.display(),
            "Generated site map"
        );
        Ok(stats)
    }

    /// Write each record's markdown under `content/`; returns distinct files written.
    fn write_content(&self, records: &[PageRecord]) -> Result<usize> {
        let content_dir = self.output_dir.join(CONTENT_DIR);
        fs::create_dir_all(&content_dir)?;

        let mut written = std::collections::BTreeSet::new();
        for record in records {
            let key = record.content_file();
            let path = content_dir.join(&key);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            write_atomic(&path, &record.markdown)?;
            debug!(path = %record.path, tokens = record.token_count, "Wrote content file");
            written.insert(key);
        }
        Ok(written.len())
    }
}

/// Write via a sibling temp file and rename into place.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let mut tmp_name = path
        .file_name()
        .ok_or_else(|| Error::Other(format!("invalid output path {}", path.display())))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, content)?;

    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
