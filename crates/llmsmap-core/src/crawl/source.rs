use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PageSource, UrlFilter};
use crate::page::ScrapedPage;
use crate::{Error, Result};

/// [`PageSource`] reading previously scraped pages from a JSON file.
///
/// Accepts either a JSON array of pages or one page object per line.
#[derive(Debug, Clone)]
pub struct JsonPageSource {
    path: PathBuf,
    filter: Option<UrlFilter>,
}

impl JsonPageSource {
    /// Read pages from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filter: None,
        }
    }

    /// Apply include/exclude globs to the loaded pages.
    #[must_use]
    pub fn with_filter(mut self, filter: UrlFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Source file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_pages(raw: &str) -> Result<Vec<ScrapedPage>> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::Parse(format!("line {}: {e}", n + 1)))
        })
        .collect()
}

#[async_trait::async_trait]
impl PageSource for JsonPageSource {
    async fn fetch_pages(&self) -> Result<Vec<ScrapedPage>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut pages = parse_pages(&raw)?;
        let loaded = pages.len();
        if let Some(filter) = &self.filter {
            pages.retain(|p| filter.allows(&p.url));
        }
        debug!(path = %self.path.display(), loaded, kept = pages.len(), "Loaded pages");
        Ok(pages)
    }
}
