//! Manifest types for generated site maps.
//!
//! The [`Manifest`] is the persisted path → section lookup table the fetch
//! handler reads. It is built once per generation run from the aggregated
//! tree and never mutated afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::indexer::TreeNode;

/// The current manifest format version.
///
/// Bump this when making breaking changes to the manifest structure.
pub const MANIFEST_VERSION: &str = "1.0";

/// Prefix joined onto content-file keys in manifest entries.
pub const CONTENT_DIR: &str = "content";

/// Site metadata recorded in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Display name.
    pub name: String,
    /// Site root URL.
    pub url: String,
    /// Short description.
    pub description: String,
}

/// One content-bearing node of the site tree.
///
/// Token count and date are the node's aggregated values; `children` lists
/// direct child paths only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSection {
    /// Section path (manifest key).
    pub path: String,
    /// Page title.
    pub title: String,
    /// Page description.
    pub description: String,
    /// Aggregated token count of the subtree.
    pub token_count: u64,
    /// Most recent date in the subtree.
    pub last_updated: String,
    /// Content location relative to the output directory.
    pub content_file: String,
    /// Direct child paths.
    #[serde(default)]
    pub children: Vec<String>,
}

/// Flattened site map persisted as `manifest.json`.
///
/// ## Example
///
/// ```rust
/// use llmsmap_core::generate::{Manifest, SiteInfo};
/// use llmsmap_core::indexer::{aggregate, build_tree};
/// use llmsmap_core::page::PageRecord;
///
/// let intro = PageRecord {
///     url: "https://example.com/docs/intro".into(),
///     path: "/docs/intro".into(),
///     title: "Intro".into(),
///     description: String::new(),
///     markdown: "Hello".into(),
///     token_count: 100,
///     last_updated: "2024-01-01".into(),
/// };
///
/// let tree = aggregate(build_tree(&[intro]));
/// let manifest = Manifest::from_tree(&tree, SiteInfo::default(), "/llms/fetch");
///
/// assert_eq!(manifest.total_pages, 1);
/// assert_eq!(manifest.sections["/docs/intro"].content_file, "content/docs/intro.md");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Format version.
    pub version: String,
    /// When the manifest was generated.
    pub generated_at: DateTime<Utc>,
    /// Site metadata.
    pub site: SiteInfo,
    /// Aggregated token count of the whole site (root rollup).
    pub total_tokens: u64,
    /// Number of content-bearing sections.
    pub total_pages: usize,
    /// Fetch endpoint path.
    pub fetch_endpoint: String,
    /// Sections keyed by path.
    pub sections: BTreeMap<String, ManifestSection>,
}

impl Manifest {
    /// Flatten an aggregated tree into a manifest stamped with the current time.
    #[must_use]
    pub fn from_tree(root: &TreeNode, site: SiteInfo, fetch_endpoint: &str) -> Self {
        Self::from_tree_at(root, site, fetch_endpoint, Utc::now())
    }

    /// Flatten an aggregated tree with an explicit generation timestamp.
    #[must_use]
    pub fn from_tree_at(
        root: &TreeNode,
        site: SiteInfo,
        fetch_endpoint: &str,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let sections: BTreeMap<String, ManifestSection> = root
            .iter()
            .filter_map(|node| {
                let file = node.content_file.as_deref()?;
                Some((
                    node.path.clone(),
                    ManifestSection {
                        path: node.path.clone(),
                        title: node.title.clone(),
                        description: node.description.clone(),
                        token_count: node.token_count,
                        last_updated: node.last_updated.clone(),
                        content_file: format!("{CONTENT_DIR}/{file}"),
                        children: node.children.iter().map(|c| c.path.clone()).collect(),
                    },
                ))
            })
            .collect();

        Self {
            version: MANIFEST_VERSION.to_string(),
            generated_at,
            site,
            total_tokens: root.token_count,
            total_pages: sections.len(),
            fetch_endpoint: fetch_endpoint.to_string(),
            sections,
        }
    }

    /// Parse a manifest document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) for
    /// malformed JSON or a document missing required fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if
    /// serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a section by exact path.
    #[must_use]
    pub fn section(&self, path: &str) -> Option<&ManifestSection> {
        self.sections.get(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::indexer::{aggregate, build_tree};
    use crate::page::PageRecord;
    use proptest::prelude::*;

    fn record(path: &str, tokens: u64, date: &str) -> PageRecord {
        PageRecord {
            url: format!("https://example.com{path}"),
            path: path.to_string(),
            title: format!("Title {path}"),
            description: String::new(),
            markdown: String::new(),
            token_count: tokens,
            last_updated: date.to_string(),
        }
    }

    fn site() -> SiteInfo {
        SiteInfo {
            name: "Example".to_string(),
            url: "https://example.com".to_string(),
            description: "An example".to_string(),
        }
    }

    #[test]
    fn test_sections_only_for_content_nodes() {
        let tree = aggregate(build_tree(&[
            record("/docs/intro", 100, "2024-01-01"),
            record("/docs/setup", 80, "2024-02-01"),
        ]));

        let manifest = Manifest::from_tree(&tree, site(), "/llms/fetch");

        // Placeholder root and synthesized /docs carry no content
        assert_eq!(manifest.total_pages, 2);
        assert!(manifest.section("/").is_none());
        assert!(manifest.section("/docs").is_none());
        assert_eq!(manifest.total_tokens, 180);
    }

    #[test]
    fn test_children_are_direct_paths_only() {
        let tree = aggregate(build_tree(&[
            record("/docs", 10, "2024-01-01"),
            record("/docs/api/auth", 10, "2024-01-01"),
            record("/docs/intro", 10, "2024-01-01"),
        ]));

        let manifest = Manifest::from_tree(&tree, site(), "/llms/fetch");
        let docs = manifest.section("/docs").expect("docs section");

        assert_eq!(docs.children, vec!["/docs/api", "/docs/intro"]);
        assert_eq!(docs.token_count, 30);
        assert_eq!(docs.content_file, "content/docs.md");
    }

    #[test]
    fn test_root_section_uses_root_content_file() {
        let tree = aggregate(build_tree(&[record("/", 50, "2024-01-01")]));
        let manifest = Manifest::from_tree(&tree, site(), "/llms/fetch");

        assert_eq!(manifest.section("/").unwrap().content_file, "content/_root.md");
    }

    #[test]
    fn test_manifest_serialization_shape() {
        let tree = aggregate(build_tree(&[record("/a", 5, "2024-03-01")]));
        let manifest = Manifest::from_tree(&tree, site(), "/llms/fetch");

        let json = manifest.to_json_pretty().expect("Should serialize");

        // Verify camelCase
        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"totalTokens\": 5"));
        assert!(json.contains("\"totalPages\": 1"));
        assert!(json.contains("\"fetchEndpoint\": \"/llms/fetch\""));
        assert!(json.contains("\"tokenCount\""));
        assert!(json.contains("\"lastUpdated\""));
        assert!(json.contains("\"contentFile\""));
        assert!(json.contains("\"version\": \"1.0\""));

        let parsed = Manifest::from_json(&json).expect("Should deserialize");
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = Manifest::from_json("{\"version\": 1}").unwrap_err();
        assert_eq!(err.category(), "serialization");
    }

    fn arb_records() -> impl Strategy<Value = Vec<PageRecord>> {
        let segment = prop::sample::select(vec!["a", "b", "guide", "docs"]);
        let path = prop::collection::vec(segment, 0..4)
            .prop_map(|segs| format!("/{}", segs.join("/")));
        prop::collection::vec(
            (path, 1u64..500).prop_map(|(p, t)| record(&p, t, "2024-01-01")),
            0..20,
        )
    }

    proptest! {
        #[test]
        fn prop_one_section_per_content_node(records in arb_records()) {
            let tree = aggregate(build_tree(&records));
            let manifest = Manifest::from_tree(&tree, site(), "/llms/fetch");

            let content_nodes: Vec<&TreeNode> = tree.iter().filter(|n| n.has_content()).collect();
            prop_assert_eq!(manifest.sections.len(), content_nodes.len());
            prop_assert_eq!(manifest.total_pages, content_nodes.len());

            for node in content_nodes {
                let section = manifest.section(&node.path);
                prop_assert!(section.is_some());
                let expected: Vec<String> = node.children.iter().map(|c| c.path.clone()).collect();
                prop_assert_eq!(&section.unwrap().children, &expected);
            }
        }
    }
}
