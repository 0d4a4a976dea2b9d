//! Generation pipeline: page records in, output directory out.
//!
//! ## Key Types
//!
//! - [`Generator`]: builds and aggregates the tree, then writes content
//!   files, `manifest.json` and `llmsmap.txt`
//! - [`Manifest`]: the persisted path → section lookup table
//! - [`GenerateStats`]: sizes and totals reported after a run
//!
//! ## Example
//!
//! ```rust,no_run
//! use llmsmap_core::generate::Generator;
//! use llmsmap_core::page::{ScrapedPage, process_pages};
//!
//! let day = chrono::Utc::now().date_naive();
//! let records = process_pages(
//!     &[ScrapedPage::new("https://example.com/", "# Example\n\nWelcome.")],
//!     day,
//! );
//!
//! let stats = Generator::new(".llmsmap", "https://example.com").run(&records)?;
//! println!("{} pages, {} tokens", stats.total_pages, stats.total_tokens);
//! # Ok::<(), llmsmap_core::Error>(())
//! ```

mod manifest;
mod output;

pub use manifest::{CONTENT_DIR, MANIFEST_VERSION, Manifest, ManifestSection, SiteInfo};
pub use output::{GenerateStats, Generator, INDEX_FILE, MANIFEST_FILE};
