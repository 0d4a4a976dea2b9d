//! # llmsmap-core
//!
//! Core functionality for llmsmap - a composable-context site map generator.
//!
//! This crate turns a crawled site into three artifacts an LLM agent can
//! navigate: a human-readable site map (`llmsmap.txt`), a machine-readable
//! manifest (`manifest.json`) and one markdown file per page. It also
//! answers fetch requests that select sections by path, wildcard or
//! keyword search.
//!
//! ## Architecture
//!
//! - **Crawl**: [`crawl::PageSource`] implementations produce scraped pages
//! - **Pages**: [`page`] cleans markdown, derives paths and estimates tokens
//! - **Indexer**: [`indexer`] builds the path tree and rolls totals upward
//! - **Generate**: [`generate::Generator`] writes the output directory
//! - **Retrieval**: [`retrieval::FetchHandler`] serves section requests
//! - **Error Handling**: [`Error`] with categorization and recovery hints
//!
//! ## Quick Start
//!
//! ```rust
//! use llmsmap_core::page::{ScrapedPage, process_pages};
//! use llmsmap_core::{Generator, FetchHandler, FsContentStore};
//!
//! let out = tempfile::tempdir()?;
//! let day = chrono::NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or_default();
//! let records = process_pages(
//!     &[
//!         ScrapedPage::new("https://example.com/", "# Example\n\nWelcome."),
//!         ScrapedPage::new("https://example.com/docs/intro", "# Intro\n\nStart here."),
//!     ],
//!     day,
//! );
//!
//! let stats = Generator::new(out.path(), "https://example.com").run(&records)?;
//! assert_eq!(stats.total_pages, 2);
//!
//! let handler = FetchHandler::new(FsContentStore::new(out.path()));
//! let response = handler.handle_query("sections=/docs/*");
//! assert_eq!(response.status, 200);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`]:
//!
//! ```rust
//! use llmsmap_core::{Error, SiteConfig};
//!
//! let config = SiteConfig::default();
//! match config.validate() {
//!     Ok(()) => println!("ready"),
//!     Err(Error::Config(msg)) => eprintln!("Config error: {msg}"),
//!     Err(e) => eprintln!("[{}] {e}", e.category()),
//! }
//! ```

/// Site configuration, file discovery and layering
pub mod config;
/// Page sources: Firecrawl crawling and saved page files
pub mod crawl;
/// Error types and result aliases
pub mod error;
/// Output generation: content files, manifest and site map
pub mod generate;
/// Path tree building, aggregation and index rendering
pub mod indexer;
/// Scraped page processing
pub mod page;
/// Section resolution and fetch handling
pub mod retrieval;

// Re-export commonly used types
pub use config::{ConfigOverrides, FetchEndpointConfig, SiteConfig};
pub use crawl::{CrawlOptions, FirecrawlClient, FirecrawlSource, JsonPageSource, PageSource};
pub use error::{Error, Result};
pub use generate::{GenerateStats, Generator, Manifest, ManifestSection, SiteInfo};
pub use indexer::{TreeNode, aggregate, build_tree, render_index};
pub use page::{PageRecord, ScrapedPage, process_pages};
pub use retrieval::{
    ContentStore, FetchHandler, FetchRequest, FetchResponse, FsContentStore, MemoryContentStore,
    ResponseFormat, SectionResolver,
};
