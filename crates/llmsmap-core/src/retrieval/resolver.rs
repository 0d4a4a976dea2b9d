//! Section resolution: path/wildcard lookup and keyword search.
//!
//! Both operations read a loaded [`Manifest`] plus a [`ContentStore`] and
//! never fail: sections whose content is missing are dropped from the
//! result, as are sections excluded by [`SectionFilters`].
//!
//! ## Search scoring
//!
//! | signal | weight |
//! |---|---|
//! | query occurs in path | 10 |
//! | query occurs in title | 8 |
//! | query occurs in description | 5 |
//! | each occurrence in content | 1, at most 5 |
//!
//! Matching is case-insensitive on the whole query. The root page and
//! sections above [`MAX_SEARCH_TOKENS`] are never search candidates.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::pattern::PathPattern;
use super::store::ContentStore;
use crate::generate::{Manifest, ManifestSection};

/// Default maximum number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Sections larger than this are skipped by search.
pub const MAX_SEARCH_TOKENS: u64 = 50_000;

const PATH_WEIGHT: u32 = 10;
const TITLE_WEIGHT: u32 = 8;
const DESCRIPTION_WEIGHT: u32 = 5;
const CONTENT_WEIGHT: u32 = 1;
const MAX_CONTENT_HITS: usize = 5;

/// Filters shared by both resolution modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFilters {
    /// Keep only sections whose `last_updated` is strictly after this date.
    pub updated_after: Option<String>,
}

impl SectionFilters {
    fn admits(&self, section: &ManifestSection) -> bool {
        self.updated_after
            .as_deref()
            .is_none_or(|cutoff| section.last_updated.as_str() > cutoff)
    }
}

/// A manifest section with its content attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSection {
    /// Section metadata.
    #[serde(flatten)]
    pub section: ManifestSection,
    /// Raw markdown content.
    pub content: String,
}

/// A search result with its relevance score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Relevance score (always > 0).
    pub score: u32,
    /// Matching section.
    pub section: ResolvedSection,
}

/// Resolves queries against one manifest and content store.
#[derive(Debug, Clone)]
pub struct SectionResolver<S> {
    manifest: Arc<Manifest>,
    store: S,
}

impl<S: ContentStore> SectionResolver<S> {
    /// Bind a resolver to a manifest and its content.
    pub const fn new(manifest: Arc<Manifest>, store: S) -> Self {
        Self { manifest, store }
    }

    /// Resolve exact and wildcard path patterns.
    ///
    /// Each pattern's matches come out in ascending path order; across
    /// patterns, the first occurrence of a path wins.
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use llmsmap_core::generate::{Manifest, SiteInfo};
    /// # use llmsmap_core::indexer::{aggregate, build_tree};
    /// # use llmsmap_core::page::PageRecord;
    /// use llmsmap_core::retrieval::{MemoryContentStore, SectionFilters, SectionResolver};
    ///
    /// # let page = |path: &str| PageRecord {
    /// #     url: String::new(), path: path.into(), title: path.into(),
    /// #     description: String::new(), markdown: String::new(),
    /// #     token_count: 1, last_updated: "2024-01-01".into(),
    /// # };
    /// # let tree = aggregate(build_tree(&[page("/docs/setup"), page("/docs/intro")]));
    /// # let manifest = Manifest::from_tree(&tree, SiteInfo::default(), "/llms/fetch");
    /// let store = MemoryContentStore::new()
    ///     .with("content/docs/intro.md", "intro")
    ///     .with("content/docs/setup.md", "setup");
    /// let resolver = SectionResolver::new(Arc::new(manifest), store);
    ///
    /// let found = resolver.resolve_sections(&["/docs/*"], &SectionFilters::default());
    /// let paths: Vec<&str> = found.iter().map(|s| s.section.path.as_str()).collect();
    /// assert_eq!(paths, ["/docs/intro", "/docs/setup"]);
    /// ```
    pub fn resolve_sections<P: AsRef<str>>(
        &self,
        patterns: &[P],
        filters: &SectionFilters,
    ) -> Vec<ResolvedSection> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for raw in patterns {
            let pattern = PathPattern::new(raw.as_ref());
            let matches: Vec<&ManifestSection> = if pattern.is_wildcard() {
                self.manifest
                    .sections
                    .values()
                    .filter(|s| pattern.matches(&s.path))
                    .collect()
            } else {
                self.manifest.section(pattern.as_str()).into_iter().collect()
            };

            if matches.is_empty() {
                debug!(pattern = %pattern.as_str(), "Pattern matched no sections");
            }

            for section in matches {
                if !seen.insert(section.path.as_str()) || !filters.admits(section) {
                    continue;
                }
                if let Some(content) = self.load_content(section) {
                    resolved.push(ResolvedSection {
                        section: section.clone(),
                        content,
                    });
                }
            }
        }

        resolved
    }

    /// Keyword search ranked by relevance, highest first.
    ///
    /// A blank query returns nothing. Ties are ordered by ascending path.
    pub fn search_sections(
        &self,
        query: &str,
        filters: &SectionFilters,
        limit: usize,
    ) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .manifest
            .sections
            .values()
            .filter(|s| s.path != "/" && s.token_count <= MAX_SEARCH_TOKENS)
            .filter(|s| filters.admits(s))
            .filter_map(|section| {
                let content = self.load_content(section)?;
                let score = score_section(section, &content, &needle);
                (score > 0).then(|| SearchHit {
                    score,
                    section: ResolvedSection {
                        section: section.clone(),
                        content,
                    },
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.section.section.path.cmp(&b.section.section.path))
        });
        hits.truncate(limit);

        debug!(query = %query, hits = hits.len(), "Search complete");
        hits
    }

    fn load_content(&self, section: &ManifestSection) -> Option<String> {
        match self.store.read(&section.content_file) {
            Ok(Some(content)) => Some(content),
            Ok(None) => {
                debug!(path = %section.path, file = %section.content_file, "Content missing, skipping section");
                None
            },
            Err(e) => {
                warn!(path = %section.path, error = %e, "Failed to read content, skipping section");
                None
            },
        }
    }
}

/// Relevance of one section for a lowercased, non-empty query.
fn score_section(section: &ManifestSection, content: &str, needle: &str) -> u32 {
    let mut score = 0;
    if section.path.to_lowercase().contains(needle) {
        score += PATH_WEIGHT;
    }
    if section.title.to_lowercase().contains(needle) {
        score += TITLE_WEIGHT;
    }
    if section.description.to_lowercase().contains(needle) {
        score += DESCRIPTION_WEIGHT;
    }

    let occurrences = content
        .to_lowercase()
        .matches(needle)
        .take(MAX_CONTENT_HITS)
        .count();
    // Bounded by MAX_CONTENT_HITS
    #[allow(clippy::cast_possible_truncation)]
    let occurrences = occurrences as u32;
    score + occurrences * CONTENT_WEIGHT
}
