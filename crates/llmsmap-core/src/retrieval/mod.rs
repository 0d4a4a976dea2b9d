//! Retrieval: answering fetch requests against a generated manifest.
//!
//! ```text
//! FetchRequest ─▶ FetchHandler ─▶ SectionResolver ─▶ format_response ─▶ FetchResponse
//!                     │                 │
//!               ManifestCache      ContentStore
//! ```
//!
//! The handler loads `manifest.json` from its [`ContentStore`] on first use
//! and keeps it in a handler-owned [`ManifestCache`].

mod format;
mod handler;
mod pattern;
mod resolver;
mod store;

pub use format::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_MARKDOWN, CONTENT_TYPE_TEXT, FormattedResponse, ParsedSection,
    ResponseFormat, format_response, parse_markdown_response,
};
pub use handler::{
    CONFLICTING_SELECTORS, FetchHandler, FetchRequest, FetchResponse, MISSING_SELECTOR,
    ManifestCache,
};
pub use pattern::{PathPattern, WILDCARD};
pub use resolver::{
    DEFAULT_SEARCH_LIMIT, MAX_SEARCH_TOKENS, ResolvedSection, SearchHit, SectionFilters,
    SectionResolver,
};
pub use store::{ContentStore, FsContentStore, MemoryContentStore};
