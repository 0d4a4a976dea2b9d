//! Page records and scraped-page processing.
//!
//! The crawl service hands back [`ScrapedPage`]s: a URL, its markdown and
//! whatever metadata the scraper found. [`process_pages`] normalizes those
//! into [`PageRecord`]s, the immutable input of the tree builder.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use llmsmap_core::page::{ScrapedPage, process_page};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let page = ScrapedPage::new(
//!     "https://example.com/docs/getting-started/",
//!     "# Getting Started | Example Docs\n\nInstall the package and run it.",
//! );
//!
//! let record = process_page(&page, day);
//! assert_eq!(record.path, "/docs/getting-started");
//! assert_eq!(record.title, "Getting Started");
//! assert_eq!(record.last_updated, "2024-03-01");
//! ```

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Content-file key used for the site root.
pub const ROOT_CONTENT_FILE: &str = "_root.md";

static CL100K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| match tiktoken_rs::cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        warn!(error = %e, "cl100k_base tokenizer unavailable, falling back to word estimate");
        None
    },
});

#[allow(clippy::expect_used)]
static EXCESS_NEWLINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline regex is valid"));

#[allow(clippy::expect_used)]
static SKIP_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\[Skip to .*?\]\(.*?\)\n*").expect("skip-link regex is valid")
});

#[allow(clippy::expect_used)]
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("heading regex is valid"));

#[allow(clippy::expect_used)]
static TITLE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+[|–—-]\s+[^|–—-]+$").expect("title suffix regex is valid")
});

/// A page as returned by the crawl service.
///
/// Only `url` and `markdown` are required; the remaining metadata is used
/// when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedPage {
    /// Absolute URL of the page.
    pub url: String,
    /// Main content rendered as markdown.
    pub markdown: String,
    /// `<title>` or equivalent metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Meta description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// HTTP status observed by the scraper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ScrapedPage {
    /// Create a page with no metadata.
    #[must_use]
    pub fn new(url: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markdown: markdown.into(),
            title: None,
            description: None,
            status_code: None,
        }
    }

    /// Set the scraped title.
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Set the scraped description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// One processed page: the unit the tree builder consumes.
///
/// `path` always has a leading slash and no trailing slash (except `/`).
/// `last_updated` is an ISO `YYYY-MM-DD` date, so string order is
/// chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Source URL.
    pub url: String,
    /// Site-relative path.
    pub path: String,
    /// Cleaned page title.
    pub title: String,
    /// Short description, possibly empty.
    pub description: String,
    /// Cleaned markdown content.
    pub markdown: String,
    /// Estimated token count of `markdown`.
    pub token_count: u64,
    /// Last-updated date (`YYYY-MM-DD`).
    pub last_updated: String,
}

impl PageRecord {
    /// Key under which this page's content is persisted.
    #[must_use]
    pub fn content_file(&self) -> String {
        content_file_for_path(&self.path)
    }
}

/// Process every scraped page, stamping each with `generated_on`.
#[must_use]
pub fn process_pages(pages: &[ScrapedPage], generated_on: NaiveDate) -> Vec<PageRecord> {
    pages
        .iter()
        .map(|page| process_page(page, generated_on))
        .collect()
}

/// Normalize a single scraped page into a [`PageRecord`].
#[must_use]
pub fn process_page(page: &ScrapedPage, generated_on: NaiveDate) -> PageRecord {
    let path = url_to_path(&page.url);
    let markdown = clean_markdown(&page.markdown);

    let raw_title = page
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .or_else(|| extract_title(&markdown))
        .unwrap_or_else(|| path_to_title(&path));
    let title = clean_title(&raw_title);

    // Site-wide meta descriptions are common, so prefer the page's own prose.
    let description = extract_description(&markdown)
        .or_else(|| page.description.clone())
        .unwrap_or_default();

    PageRecord {
        url: page.url.clone(),
        path,
        title,
        description,
        token_count: estimate_tokens(&markdown),
        markdown,
        last_updated: generated_on.format("%Y-%m-%d").to_string(),
    }
}

/// Convert an absolute URL to a site path.
///
/// Inputs that do not parse as URLs are treated as paths already.
#[must_use]
pub fn url_to_path(url: &str) -> String {
    let raw = url::Url::parse(url).map_or_else(|_| url.to_string(), |u| u.path().to_string());
    normalize_path(&raw)
}

/// Normalize a path: leading slash, no empty or dot segments, no trailing slash.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Map a page path to its content-file key.
///
/// ```rust
/// use llmsmap_core::page::content_file_for_path;
///
/// assert_eq!(content_file_for_path("/"), "_root.md");
/// assert_eq!(content_file_for_path("/pricing"), "pricing.md");
/// assert_eq!(content_file_for_path("/docs/api/auth"), "docs/api/auth.md");
/// ```
#[must_use]
pub fn content_file_for_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        ROOT_CONTENT_FILE.to_string()
    } else {
        format!("{}.md", segments.join("/"))
    }
}

/// Turn a path segment into a display title.
///
/// Hyphens and underscores become spaces and each word starts uppercase.
///
/// ```rust
/// use llmsmap_core::page::humanize_segment;
///
/// assert_eq!(humanize_segment("getting-started"), "Getting Started");
/// assert_eq!(humanize_segment("api_v2"), "Api V2");
/// ```
#[must_use]
pub fn humanize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut in_word = false;
    for ch in segment.chars() {
        let ch = if ch == '-' || ch == '_' { ' ' } else { ch };
        let is_word = ch.is_ascii_alphanumeric();
        if is_word && !in_word {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        in_word = is_word;
    }
    out
}

/// Count tokens with the `cl100k_base` encoding.
///
/// Falls back to [`estimate_tokens_by_words`] if the encoding cannot be
/// loaded.
///
/// ```rust
/// use llmsmap_core::page::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("hello world"), 2);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    CL100K.as_ref().map_or_else(
        || estimate_tokens_by_words(text),
        |bpe| bpe.encode_with_special_tokens(text).len() as u64,
    )
}

/// Estimate tokens as `ceil(words * 1.3)`.
///
/// ```rust
/// use llmsmap_core::page::estimate_tokens_by_words;
///
/// assert_eq!(estimate_tokens_by_words("one two three"), 4);
/// assert_eq!(estimate_tokens_by_words("a b c d e f g h i j"), 13);
/// ```
#[must_use]
pub fn estimate_tokens_by_words(text: &str) -> u64 {
    let words = text.split_whitespace().count() as u64;
    (words * 13).div_ceil(10)
}

fn clean_markdown(markdown: &str) -> String {
    let collapsed = EXCESS_NEWLINES_RE.replace_all(markdown, "\n\n");
    let without_skip = SKIP_LINK_RE.replace(&collapsed, "");
    without_skip.trim().to_string()
}

fn extract_title(markdown: &str) -> Option<String> {
    H1_RE
        .captures(markdown)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn extract_description(markdown: &str) -> Option<String> {
    let mut found_heading = false;
    for line in markdown.lines() {
        if line.starts_with('#') {
            found_heading = true;
            continue;
        }
        if !found_heading || line.starts_with('!') || line.starts_with('[') {
            continue;
        }
        let candidate = line.trim();
        let len = candidate.chars().count();
        if len > 10 && len < 300 {
            return Some(candidate.to_string());
        }
    }
    None
}

fn path_to_title(path: &str) -> String {
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .map_or_else(|| "Home".to_string(), humanize_segment)
}

fn clean_title(title: &str) -> String {
    let stripped = TITLE_SUFFIX_RE.replace(title, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        title.trim().to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn test_token_counts_use_cl100k() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("hello world"), 2);
        // BPE splits rare words, so counts differ from the word estimate
        let text = "antidisestablishmentarianism";
        assert!(estimate_tokens(text) > estimate_tokens_by_words(text));
    }

    #[test]
    fn test_word_estimate_rounds_up() {
        assert_eq!(estimate_tokens_by_words(""), 0);
        assert_eq!(estimate_tokens_by_words("  one\ttwo\n three "), 4);
        assert_eq!(estimate_tokens_by_words("a b c d e f g h i j"), 13);
    }

    #[test]
    fn test_url_to_path_variants() {
        assert_eq!(url_to_path("https://example.com"), "/");
        assert_eq!(url_to_path("https://example.com/"), "/");
        assert_eq!(url_to_path("https://example.com/docs/"), "/docs");
        assert_eq!(url_to_path("https://example.com/docs/intro?x=1#top"), "/docs/intro");
        assert_eq!(url_to_path("/already/a/path/"), "/already/a/path");
        assert_eq!(url_to_path("../../etc/./passwd"), "/etc/passwd");
    }

    #[test]
    fn test_clean_markdown_collapses_blank_runs() {
        let cleaned = clean_markdown("[Skip to content](#main)\n\n# Title\n\n\n\n\nBody\n");
        assert_eq!(cleaned, "# Title\n\nBody");
    }

    #[test]
    fn test_title_prefers_scraped_metadata() {
        let page = ScrapedPage::new("https://example.com/a", "# Heading\n\nbody text here")
            .with_title(Some("Setup Guide | Example".to_string()));

        let record = process_page(&page, day());
        assert_eq!(record.title, "Setup Guide");
    }

    #[test]
    fn test_title_falls_back_to_heading_then_path() {
        let from_heading = process_page(
            &ScrapedPage::new("https://example.com/x", "# Real Heading\n\nHello"),
            day(),
        );
        assert_eq!(from_heading.title, "Real Heading");

        let from_path = process_page(
            &ScrapedPage::new("https://example.com/release-notes", "no heading"),
            day(),
        );
        assert_eq!(from_path.title, "Release Notes");

        let root = process_page(&ScrapedPage::new("https://example.com/", "plain"), day());
        assert_eq!(root.title, "Home");
    }

    #[test]
    fn test_clean_title_keeps_hyphenated_words() {
        assert_eq!(clean_title("Step-by-step"), "Step-by-step");
        assert_eq!(clean_title("Home - My Site"), "Home");
        assert_eq!(clean_title("Pricing — Acme"), "Pricing");
    }

    #[test]
    fn test_description_prefers_content_paragraph() {
        let page = ScrapedPage::new(
            "https://example.com/docs",
            "# Docs\n\n![logo](x.png)\n[link](y)\nshort\nThis paragraph describes the docs.",
        )
        .with_description(Some("Site-wide tagline".to_string()));

        let record = process_page(&page, day());
        assert_eq!(record.description, "This paragraph describes the docs.");
    }

    #[test]
    fn test_description_falls_back_to_metadata() {
        let page = ScrapedPage::new("https://example.com/docs", "no heading here at all")
            .with_description(Some("Meta description".to_string()));

        let record = process_page(&page, day());
        assert_eq!(record.description, "Meta description");
    }

    #[test]
    fn test_record_fields() {
        let record = process_page(
            &ScrapedPage::new("https://example.com/docs/setup", "# Setup\n\none two three"),
            day(),
        );
        assert_eq!(record.last_updated, "2024-02-01");
        assert_eq!(record.token_count, estimate_tokens(&record.markdown));
        assert!(record.token_count > 0);
        assert_eq!(record.content_file(), "docs/setup.md");
    }
}
