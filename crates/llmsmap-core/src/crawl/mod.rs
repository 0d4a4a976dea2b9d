//! Page acquisition.
//!
//! A [`PageSource`] produces the scraped pages a generation run starts
//! from. [`FirecrawlSource`] crawls a live site through the Firecrawl API;
//! [`JsonPageSource`] replays pages saved to disk.

mod filter;
mod firecrawl;
mod source;

use std::sync::Arc;

pub use filter::UrlFilter;
pub use firecrawl::{
    CrawlOptions, DEFAULT_API_BASE, DEFAULT_CRAWL_TIMEOUT, DEFAULT_POLL_INTERVAL, FirecrawlClient,
    FirecrawlSource,
};
pub use source::JsonPageSource;

use crate::Result;
use crate::page::ScrapedPage;

/// Progress callback for crawls.
///
/// Called with (status, completed, total) after each status poll.
pub type CrawlProgress = Arc<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Source of scraped pages (allows mocking in tests).
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Produce every page for one generation run.
    async fn fetch_pages(&self) -> Result<Vec<ScrapedPage>>;
}
