//! Hierarchical path tree built from page records.

use serde::{Deserialize, Serialize};

use crate::page::{PageRecord, content_file_for_path, humanize_segment};

/// Title of the placeholder root when no page exists at `/`.
pub const DEFAULT_ROOT_TITLE: &str = "Home";

/// One path-addressed node in the site hierarchy.
///
/// A node may carry content, have children, or both (`/docs` can be a page
/// and a directory at the same time). Directory nodes synthesized to fill
/// path gaps have no content file and zero own tokens.
///
/// `own_tokens`/`own_updated` describe this node's page alone and never
/// change after building; `token_count`/`last_updated` are the rolled-up
/// values written by [`aggregate`](super::aggregate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Normalized path (`/`, `/docs`, `/docs/intro`).
    pub path: String,
    /// Page title, or the humanized segment for directories.
    pub title: String,
    /// Page description, possibly empty.
    pub description: String,
    /// Tokens of this node's own content.
    pub own_tokens: u64,
    /// Own tokens plus all descendants (after aggregation).
    pub token_count: u64,
    /// Own last-updated date; empty for synthesized nodes.
    pub own_updated: String,
    /// Most recent date in the subtree (after aggregation).
    pub last_updated: String,
    /// Direct children.
    pub children: Vec<TreeNode>,
    /// Content-file key, present iff this node has stored content.
    pub content_file: Option<String>,
    /// Number of path segments (root is 0).
    pub depth: usize,
}

impl TreeNode {
    /// Placeholder root used when no record exists for `/`.
    #[must_use]
    pub fn placeholder_root() -> Self {
        Self::directory("/", DEFAULT_ROOT_TITLE.to_string(), 0)
    }

    fn directory(path: &str, title: String, depth: usize) -> Self {
        Self {
            path: path.to_string(),
            title,
            description: String::new(),
            own_tokens: 0,
            token_count: 0,
            own_updated: String::new(),
            last_updated: String::new(),
            children: Vec::new(),
            content_file: None,
            depth,
        }
    }

    /// Overwrite this node's page fields with `record`, keeping children.
    fn apply(&mut self, record: &PageRecord) {
        self.title.clone_from(&record.title);
        self.description.clone_from(&record.description);
        self.own_tokens = record.token_count;
        self.token_count = record.token_count;
        self.own_updated.clone_from(&record.last_updated);
        self.last_updated.clone_from(&record.last_updated);
        self.content_file = Some(content_file_for_path(&self.path));
    }

    /// Whether this node has stored page content.
    #[must_use]
    pub const fn has_content(&self) -> bool {
        self.content_file.is_some()
    }

    /// Sum of the direct children's token counts.
    #[must_use]
    pub fn child_tokens(&self) -> u64 {
        self.children.iter().map(|c| c.token_count).sum()
    }

    /// Number of content-bearing nodes in this subtree, self included.
    #[must_use]
    pub fn content_page_count(&self) -> usize {
        usize::from(self.has_content())
            + self
                .children
                .iter()
                .map(Self::content_page_count)
                .sum::<usize>()
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Find a node by exact path.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Self> {
        self.iter().find(|n| n.path == path)
    }
}

/// Build the path tree from page records.
///
/// One node exists per distinct path prefix. Records with the same path
/// overwrite each other in input order (last write wins); callers wanting
/// first-write-wins should dedupe beforehand. Children are left in
/// insertion order until aggregation sorts them.
///
/// ```rust
/// use llmsmap_core::indexer::build_tree;
/// use llmsmap_core::page::PageRecord;
///
/// let record = PageRecord {
///     url: "https://example.com/docs/intro".into(),
///     path: "/docs/intro".into(),
///     title: "Intro".into(),
///     description: String::new(),
///     markdown: "hello".into(),
///     token_count: 100,
///     last_updated: "2024-01-01".into(),
/// };
///
/// let root = build_tree(&[record]);
/// let docs = root.find("/docs").unwrap();
/// assert_eq!(docs.title, "Docs");
/// assert!(docs.content_file.is_none());
/// assert_eq!(root.title, "Home");
/// ```
#[must_use]
pub fn build_tree(records: &[PageRecord]) -> TreeNode {
    let mut root = TreeNode::placeholder_root();
    for record in records {
        insert(&mut root, record);
    }
    root
}

fn insert(root: &mut TreeNode, record: &PageRecord) {
    let segments: Vec<&str> = record.path.split('/').filter(|s| !s.is_empty()).collect();

    let mut current = root;
    let mut prefix = String::with_capacity(record.path.len());
    for (idx, segment) in segments.iter().enumerate() {
        prefix.push('/');
        prefix.push_str(segment);

        let position = if let Some(pos) = current.children.iter().position(|c| c.path == prefix) {
            pos
        } else {
            current.children.push(TreeNode::directory(
                &prefix,
                humanize_segment(segment),
                idx + 1,
            ));
            current.children.len() - 1
        };
        current = &mut current.children[position];
    }

    current.apply(record);
}
