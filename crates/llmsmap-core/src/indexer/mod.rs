//! Site hierarchy: tree building, aggregation and index rendering.
//!
//! The pipeline is `build_tree` → `aggregate` → `render_index`. Building
//! assigns page data to path nodes, aggregation rolls token counts and dates
//! up to ancestors, and rendering produces the `llmsmap.txt` document.

mod aggregate;
mod render;
mod tree;

pub use aggregate::aggregate;
pub use render::{RenderOptions, RenderedIndex, format_tokens, render_index};
pub use tree::{DEFAULT_ROOT_TITLE, TreeNode, build_tree};
