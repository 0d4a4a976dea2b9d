//! Renders an aggregated tree into the `llmsmap.txt` index document.
//!
//! ## Layout
//!
//! ```text
//! # INSTRUCTIONS FOR AI AGENTS        (only with a fetch endpoint)
//! ...retrieval protocol, parameter table, quick examples...
//! ---
//! # <site name>
//! > <description>
//! > Built with llmsmap
//! ---
//! ## What is llmsmap?               (human-facing explanation)
//! ---
//! ## Site Map
//! > **N pages** | **~T tokens** total
//! - **/docs/** — Docs  (~1.2k tokens across 3 pages)
//!   - **/docs/intro** — Intro  (~400 tokens, updated 2024-01-01)
//! ```

use std::fmt::Write;

use super::TreeNode;

const DEFAULT_EXAMPLE_DIR: &str = "/docs";
const QUICK_EXAMPLE_PATHS: usize = 3;

/// Optional overrides for the rendered header and instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Site name; defaults to the root node's title.
    pub site_name: Option<String>,
    /// Site description; defaults to the root node's description.
    pub site_description: Option<String>,
    /// Absolute fetch endpoint URL. The instructions block is emitted only
    /// when this is set.
    pub fetch_endpoint: Option<String>,
    /// Site URL shown next to the name in the instructions.
    pub site_url: Option<String>,
}

/// A rendered index document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedIndex {
    /// Document text.
    pub content: String,
}

impl RenderedIndex {
    /// Serialized size in bytes (UTF-8).
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.content.len()
    }
}

/// Format a token count for display.
///
/// Values of 1000 and above are shown in thousands with one decimal and a
/// trailing `.0` dropped; smaller values are shown as plain integers.
///
/// ```rust
/// use llmsmap_core::indexer::format_tokens;
///
/// assert_eq!(format_tokens(999), "999");
/// assert_eq!(format_tokens(1000), "1k");
/// assert_eq!(format_tokens(1500), "1.5k");
/// assert_eq!(format_tokens(12_340), "12.3k");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)] // Display-only rounding
pub fn format_tokens(count: u64) -> String {
    if count >= 1000 {
        format!("{:.1}k", count as f64 / 1000.0).replacen(".0k", "k", 1)
    } else {
        count.to_string()
    }
}

/// Render the index document for an aggregated tree.
#[must_use]
pub fn render_index(root: &TreeNode, options: &RenderOptions) -> RenderedIndex {
    let title = options.site_name.as_deref().unwrap_or(&root.title);
    let description = options
        .site_description
        .as_deref()
        .unwrap_or(&root.description);

    let mut out = Doc::default();

    if let Some(endpoint) = options.fetch_endpoint.as_deref().filter(|e| !e.is_empty()) {
        render_instructions(&mut out, root, title, options.site_url.as_deref(), endpoint);
    }

    out.line(format!("# {title}"));
    if !description.is_empty() {
        out.line(format!("> {description}"));
    }
    out.blank();
    out.line("> Built with llmsmap, a composable-context site map generator.");
    out.blank();

    render_about(&mut out);

    out.line("## Site Map");
    out.blank();
    out.line(format!(
        "> **{} pages** | **~{} tokens** total",
        root.content_page_count(),
        format_tokens(root.token_count)
    ));
    out.blank();

    if root.has_content() {
        let own = root.token_count.saturating_sub(root.child_tokens());
        out.line(format!(
            "- **/** — {}  (~{} tokens, updated {})",
            root.title,
            format_tokens(own),
            root.own_updated
        ));
        if !root.description.is_empty() {
            out.line(format!("  > {}", root.description));
        }
    }

    for child in &root.children {
        render_node(&mut out, child, 0);
    }
    out.blank();

    RenderedIndex {
        content: out.finish(),
    }
}

fn render_node(out: &mut Doc, node: &TreeNode, indent: usize) {
    let pad = "  ".repeat(indent);
    let tokens = format!("~{} tokens", format_tokens(node.token_count));

    if !node.children.is_empty() {
        out.line(format!(
            "{pad}- **{}/** — {}  ({tokens} across {} pages)",
            node.path,
            node.title,
            node.content_page_count()
        ));
    } else if node.has_content() {
        out.line(format!(
            "{pad}- **{}** — {}  ({tokens}, updated {})",
            node.path, node.title, node.last_updated
        ));
    } else {
        out.line(format!("{pad}- **{}** — {}  ({tokens})", node.path, node.title));
    }

    if !node.description.is_empty() {
        out.line(format!("{pad}  > {}", node.description));
    }

    for child in &node.children {
        render_node(out, child, indent + 1);
    }
}

fn render_instructions(
    out: &mut Doc,
    root: &TreeNode,
    title: &str,
    site_url: Option<&str>,
    endpoint: &str,
) {
    let example_dir = first_directory(root).unwrap_or(DEFAULT_EXAMPLE_DIR);
    let site_suffix = site_url
        .filter(|u| !u.is_empty())
        .map(|u| format!(" ({u})"))
        .unwrap_or_default();

    out.line("# INSTRUCTIONS FOR AI AGENTS");
    out.blank();
    out.line(format!(
        "You are reading the structured content map for **{title}**{site_suffix}."
    ));
    out.line(
        "This file gives you a complete overview of every page on this site, organized \
         hierarchically with token counts and timestamps.",
    );
    out.blank();
    out.line("**Do NOT crawl this site page by page.** Instead, follow these steps:");
    out.blank();
    out.line("### Step 1: Identify Relevant Sections");
    out.line(
        "Scan the **Site Map** below. Each entry shows a page path, title, token count, \
         and last-updated date.",
    );
    out.line("Identify which sections are relevant to the user's question or your current task.");
    out.blank();
    out.line("### Step 2: Compose a Single Fetch Request");
    out.line("Use the fetch endpoint to retrieve the full markdown content of the sections you need:");
    out.blank();
    out.code(format!("GET {endpoint}?sections=/path1,/path2,/path3"));
    out.blank();
    out.line("You can request **multiple sections in one call** by comma-separating the paths.");
    out.blank();
    out.line("### Step 3: Use Wildcards for Entire Directories");
    out.line("To fetch all pages under a directory, use `*`:");
    out.blank();
    out.code(format!("GET {endpoint}?sections={example_dir}/*"));
    out.blank();
    out.line("### Step 4: Search by Keyword (when you don't know the exact path)");
    out.line("If you're unsure which sections are relevant, search by keyword:");
    out.blank();
    out.code(format!("GET {endpoint}?search=your+keyword&limit=5"));
    out.blank();
    out.line("This returns the top-scoring sections matching your query, ranked by relevance.");
    out.blank();
    out.line("### Full Parameter Reference");
    out.blank();
    out.line("| Parameter | Type | Default | Description |");
    out.line("|-----------|------|---------|-------------|");
    out.line(
        "| `sections` | comma-separated paths | — | Exact paths from the site map. Supports `*` wildcards. |",
    );
    out.line(
        "| `search` | string | — | Keyword search across all page content. Returns ranked results. |",
    );
    out.line(
        "| `format` | `md` \\| `txt` \\| `json` | `md` | Response format. Use `md` for readable content, `json` for structured data. |",
    );
    out.line("| `updated_after` | `YYYY-MM-DD` | — | Only return sections updated after this date. |");
    out.line("| `limit` | number | `10` | Maximum results for `search` queries. |");
    out.blank();
    out.line("> Use either `sections` OR `search` per request, not both.");
    out.line("> Total cost: **2 HTTP requests** — (1) this map, (2) your fetch call.");
    out.blank();

    let examples = example_paths(root, QUICK_EXAMPLE_PATHS);
    if let [first, second, ..] = examples.as_slice() {
        out.line("### Quick Examples");
        out.blank();
        out.line(format!(
            "Fetch two specific pages: `{endpoint}?sections={first},{second}`"
        ));
        out.blank();
        out.line(format!(
            "Fetch entire directory: `{endpoint}?sections={example_dir}/*`"
        ));
        out.blank();
        out.line(format!(
            "Search for a topic: `{endpoint}?search=getting+started&limit=3`"
        ));
        out.blank();
        out.line(format!("Get everything: `{endpoint}?sections=/*`"));
        out.blank();
    }

    out.line("---");
    out.blank();
}

fn render_about(out: &mut Doc) {
    out.line("---");
    out.blank();
    out.line("## What is llmsmap?");
    out.blank();
    out.line(
        "**llmsmap** makes a website AI-readable using a two-step **Composable Context** model:",
    );
    out.blank();
    out.line(
        "1. **The Map** (this file): A hierarchical index of every page on the site with titles, \
         descriptions, token counts, and timestamps.",
    );
    out.line(
        "2. **The Fetch Endpoint**: An API that returns the full markdown content of any \
         combination of pages in a single request.",
    );
    out.blank();
    out.line("### Why is this better than crawling?");
    out.blank();
    out.line("When an AI agent needs information from a website, it typically has two bad options:");
    out.blank();
    out.line("- **Read `llms.txt`**: Gets a brief table of contents, not enough to answer detailed questions.");
    out.line("- **Crawl page by page**: Slow, expensive, and wastes tokens on irrelevant pages.");
    out.blank();
    out.line(
        "**llmsmap solves this** by letting the AI see the entire site structure first, then \
         fetch only the exact pages it needs. Two HTTP requests total, regardless of site size.",
    );
    out.blank();
    out.line("### For site owners");
    out.blank();
    out.line("Generate the map and serve it next to your site:");
    out.code("llmsmap generate --url https://yoursite.com --key YOUR_FIRECRAWL_KEY");
    out.line("Deploy the generated files behind the fetch endpoint to make your site AI-optimized.");
    out.blank();
    out.line("---");
    out.blank();
}

/// First child of the root that is itself a directory.
fn first_directory(root: &TreeNode) -> Option<&str> {
    root.children
        .iter()
        .find(|c| !c.children.is_empty())
        .map(|c| c.path.as_str())
}

/// Up to `max` content-bearing, non-root paths in tree order.
fn example_paths(root: &TreeNode, max: usize) -> Vec<&str> {
    root.iter()
        .filter(|n| n.has_content() && n.path != "/")
        .map(|n| n.path.as_str())
        .take(max)
        .collect()
}

/// Line-oriented document buffer.
#[derive(Default)]
struct Doc {
    buf: String,
}

impl Doc {
    fn line(&mut self, text: impl AsRef<str>) {
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn code(&mut self, text: impl AsRef<str>) {
        // write! to String is infallible
        let _ = write!(self.buf, "```\n{}\n```\n", text.as_ref());
    }

    fn finish(mut self) -> String {
        // The document ends on a blank line rather than a dangling newline pair.
        if self.buf.ends_with("\n\n") {
            self.buf.pop();
        }
        self.buf
    }
}
