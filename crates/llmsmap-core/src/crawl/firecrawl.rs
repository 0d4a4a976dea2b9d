//! Firecrawl v1 crawl API client.
//!
//! A crawl is started with `POST /crawl` and polled with
//! `GET /crawl/{id}` until it completes or fails. Completed results may be
//! split across several responses linked by `next`.

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{CrawlProgress, PageSource, UrlFilter};
use crate::config::SiteConfig;
use crate::page::ScrapedPage;
use crate::{Error, Result};

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.firecrawl.dev/v1";

/// Delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Give up on a crawl that has not finished after this long.
pub const DEFAULT_CRAWL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Consecutive recoverable status-poll failures tolerated before giving up.
pub const MAX_POLL_RETRIES: u32 = 3;

/// What to crawl.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Start URL.
    pub url: String,
    /// Maximum pages.
    pub limit: usize,
    /// Maximum link depth.
    pub max_depth: usize,
    /// Path filter applied to returned pages.
    pub filter: UrlFilter,
}

impl CrawlOptions {
    /// Derive crawl options from site configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an include/exclude glob is invalid.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            url: config.url.clone(),
            limit: config.max_pages,
            max_depth: config.max_depth,
            filter: UrlFilter::new(&config.include, &config.exclude)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    success: bool,
    id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    completed: usize,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    data: Vec<CrawlItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrawlItem {
    markdown: Option<String>,
    #[serde(default)]
    metadata: ItemMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemMetadata {
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    status_code: Option<u16>,
}

/// HTTP client for the Firecrawl crawl API.
pub struct FirecrawlClient {
    client: Client,
    api_base: String,
    api_key: String,
    poll_interval: Duration,
    timeout: Duration,
    progress: Option<CrawlProgress>,
}

impl FirecrawlClient {
    /// Create a client for the public API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("llmsmap/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_CRAWL_TIMEOUT,
            progress: None,
        })
    }

    /// Point the client at another API base (tests, self-hosted Firecrawl).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the delay between status polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the overall crawl deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report (status, completed, total) after every poll.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(std::sync::Arc::new(callback));
        self
    }

    /// Crawl a site and return the filtered pages.
    ///
    /// # Errors
    ///
    /// - [`Error::CrawlNotAuthenticated`] if the key is rejected
    /// - [`Error::CrawlFailed`] if the job fails or the API errors
    /// - [`Error::Timeout`] if the crawl outlives the deadline
    /// - [`Error::Network`] / [`Error::Serialization`] for transport problems
    pub async fn crawl(&self, options: &CrawlOptions) -> Result<Vec<ScrapedPage>> {
        let id = self.start(options).await?;
        info!(id = %id, url = %options.url, "Started crawl");

        let deadline = Instant::now() + self.timeout;
        let mut poll_failures = 0;
        let items = loop {
            tokio::time::sleep(self.poll_interval).await;

            let status = match self.poll(&id).await {
                Ok(status) => {
                    poll_failures = 0;
                    status
                },
                Err(e) if e.is_recoverable() && poll_failures < MAX_POLL_RETRIES => {
                    poll_failures += 1;
                    warn!(id = %id, attempt = poll_failures, error = %e, "Crawl status poll failed, retrying");
                    continue;
                },
                Err(e) => return Err(e),
            };
            debug!(status = %status.status, completed = status.completed, total = status.total, "Crawl status");
            if let Some(progress) = &self.progress {
                progress(&status.status, status.completed, status.total);
            }

            let state = status.status.clone();
            match state.as_str() {
                "completed" => break self.collect_all(status).await?,
                "failed" | "cancelled" => {
                    return Err(Error::CrawlFailed {
                        reason: format!("crawl {id} {state}"),
                    });
                },
                _ if Instant::now() >= deadline => {
                    return Err(Error::Timeout(format!(
                        "crawl {id} did not finish within {}s",
                        self.timeout.as_secs()
                    )));
                },
                _ => {},
            }
        };

        let total = items.len();
        let pages: Vec<ScrapedPage> = items
            .into_iter()
            .filter_map(|item| into_page(item, &options.filter))
            .collect();
        info!(returned = total, kept = pages.len(), "Crawl complete");
        Ok(pages)
    }

    async fn start(&self, options: &CrawlOptions) -> Result<String> {
        let body = json!({
            "url": options.url,
            "limit": options.limit,
            "maxDepth": options.max_depth,
            "scrapeOptions": {
                "formats": ["markdown"],
                "onlyMainContent": true,
            },
        });
        let request = self
            .client
            .post(format!("{}/crawl", self.api_base))
            .json(&body);
        let response = self.send(request).await?;

        let start: StartResponse = serde_json::from_str(&response.text().await?)?;
        match start.id {
            Some(id) if start.success => Ok(id),
            _ => Err(Error::CrawlFailed {
                reason: start.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }

    async fn poll(&self, id: &str) -> Result<StatusResponse> {
        self.get_status(&format!("{}/crawl/{id}", self.api_base))
            .await
    }

    async fn get_status(&self, url: &str) -> Result<StatusResponse> {
        let response = self.send(self.client.get(url)).await?;
        Ok(serde_json::from_str(&response.text().await?)?)
    }

    /// Gather data from a completed status and every `next` page after it.
    async fn collect_all(&self, first: StatusResponse) -> Result<Vec<CrawlItem>> {
        let mut items = first.data;
        let mut next = first.next;
        while let Some(url) = next {
            debug!(url = %url, "Fetching next crawl results page");
            let page = self.get_status(&url).await?;
            items.extend(page.data);
            next = page.next;
        }
        Ok(items)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(Error::CrawlNotAuthenticated);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = %status, "Firecrawl request failed");
            return Err(Error::CrawlFailed {
                reason: format!("Firecrawl returned {status}: {}", detail.trim()),
            });
        }
        Ok(response)
    }
}

fn into_page(item: CrawlItem, filter: &UrlFilter) -> Option<ScrapedPage> {
    let markdown = item.markdown.filter(|m| !m.is_empty())?;
    let url = item.metadata.source_url?;
    if !filter.allows(&url) {
        debug!(url = %url, "Filtered crawled page");
        return None;
    }
    Some(ScrapedPage {
        url,
        markdown,
        title: item.metadata.title,
        description: item.metadata.description,
        status_code: item.metadata.status_code,
    })
}

/// [`PageSource`] that crawls a live site.
pub struct FirecrawlSource {
    client: FirecrawlClient,
    options: CrawlOptions,
}

impl FirecrawlSource {
    /// Bind a client to crawl options.
    #[must_use]
    pub const fn new(client: FirecrawlClient, options: CrawlOptions) -> Self {
        Self { client, options }
    }
}

#[async_trait::async_trait]
impl PageSource for FirecrawlSource {
    async fn fetch_pages(&self) -> Result<Vec<ScrapedPage>> {
        self.client.crawl(&self.options).await
    }
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    fn client(server: &MockServer) -> FirecrawlClient {
        FirecrawlClient::new("fc-test")
            .expect("client builds")
            .with_api_base(server.uri())
            .with_poll_interval(Duration::from_millis(5))
            .with_timeout(Duration::from_secs(5))
    }

    fn options(include: &[&str], exclude: &[&str]) -> CrawlOptions {
        CrawlOptions {
            url: "https://example.com".to_string(),
            limit: 50,
            max_depth: 3,
            filter: UrlFilter::new(include, exclude).unwrap(),
        }
    }

    async fn mount_start(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/crawl"))
            .and(header("authorization", "Bearer fc-test"))
            .and(body_partial_json(serde_json::json!({
                "url": "https://example.com",
                "limit": 50,
                "maxDepth": 3,
                "scrapeOptions": { "formats": ["markdown"], "onlyMainContent": true }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "success": true,
                    "id": "job-1"
                })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_crawl_collects_filtered_pages() {
        // Given: A crawl that completes with four items
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed",
                "completed": 4,
                "total": 4,
                "data": [
                    { "markdown": "# Home", "metadata": { "sourceURL": "https://example.com/", "title": "Home", "statusCode": 200 } },
                    { "markdown": "# Admin", "metadata": { "sourceURL": "https://example.com/admin/panel" } },
                    { "markdown": "", "metadata": { "sourceURL": "https://example.com/empty" } },
                    { "markdown": "# Orphan", "metadata": {} }
                ]
            })))
            .mount(&server)
            .await;

        // When: Crawling with the admin area excluded
        let pages = client(&server)
            .crawl(&options(&[], &["/admin/*"]))
            .await
            .expect("crawl succeeds");

        // Then: Only the home page survives
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "https://example.com/");
        assert_eq!(pages[0].title.as_deref(), Some("Home"));
        assert_eq!(pages[0].status_code, Some(200));
    }

    #[tokio::test]
    async fn test_crawl_polls_until_complete_and_reports_progress() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "scraping", "completed": 1, "total": 2
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed", "completed": 2, "total": 2,
                "data": [
                    { "markdown": "a", "metadata": { "sourceURL": "https://example.com/a" } },
                    { "markdown": "b", "metadata": { "sourceURL": "https://example.com/b" } }
                ]
            })))
            .mount(&server)
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let pages = client(&server)
            .with_progress(move |status, done, total| {
                sink.lock().unwrap().push((status.to_string(), done, total));
            })
            .crawl(&options(&[], &[]))
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("scraping".to_string(), 1, 2));
        assert_eq!(seen[1], ("completed".to_string(), 2, 2));
    }

    #[tokio::test]
    async fn test_crawl_follows_next_pages() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed", "completed": 2, "total": 2,
                "data": [ { "markdown": "a", "metadata": { "sourceURL": "https://example.com/a" } } ],
                "next": format!("{}/crawl/job-1/page-2", server.uri())
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1/page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed", "completed": 2, "total": 2,
                "data": [ { "markdown": "b", "metadata": { "sourceURL": "https://example.com/b" } } ]
            })))
            .mount(&server)
            .await;

        let pages = client(&server).crawl(&options(&[], &[])).await.unwrap();
        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[tokio::test]
    async fn test_transient_poll_error_is_retried() {
        // Given: A status endpoint that fails once with 503, then completes
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed", "completed": 1, "total": 1,
                "data": [ { "markdown": "a", "metadata": { "sourceURL": "https://example.com/a" } } ]
            })))
            .mount(&server)
            .await;

        // When: Crawling
        let pages = client(&server).crawl(&options(&[], &[])).await.unwrap();

        // Then: The failed poll is retried and the crawl completes
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_poll_error_gives_up() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(u64::from(MAX_POLL_RETRIES) + 1)
            .mount(&server)
            .await;

        let err = client(&server).crawl(&options(&[], &[])).await.unwrap_err();
        assert!(err.to_string().contains("500"), "got {err}");
    }

    #[tokio::test]
    async fn test_rejected_poll_is_not_retried() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).crawl(&options(&[], &[])).await.unwrap_err();
        assert!(matches!(err, Error::CrawlNotAuthenticated), "got {err:?}");
    }

    #[tokio::test]
    async fn test_rejected_key_maps_to_not_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crawl"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).crawl(&options(&[], &[])).await.unwrap_err();
        assert!(matches!(err, Error::CrawlNotAuthenticated), "got {err:?}");
    }

    #[tokio::test]
    async fn test_failed_job_is_crawl_failed() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "failed", "completed": 0, "total": 0
            })))
            .mount(&server)
            .await;

        let err = client(&server).crawl(&options(&[], &[])).await.unwrap_err();
        match err {
            Error::CrawlFailed { reason } => assert!(reason.contains("job-1")),
            other => panic!("expected CrawlFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsuccessful_start_reports_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crawl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false, "error": "Insufficient credits"
            })))
            .mount(&server)
            .await;

        let err = client(&server).crawl(&options(&[], &[])).await.unwrap_err();
        assert!(err.to_string().contains("Insufficient credits"));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_stuck_crawl_times_out() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "scraping", "completed": 0, "total": 10
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .with_timeout(Duration::from_millis(20))
            .crawl(&options(&[], &[]))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "timeout");
    }

    #[tokio::test]
    async fn test_source_delegates_to_client() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed", "completed": 1, "total": 1,
                "data": [ { "markdown": "docs", "metadata": { "sourceURL": "https://example.com/docs" } } ]
            })))
            .mount(&server)
            .await;

        let source = FirecrawlSource::new(client(&server), options(&["/docs"], &[]));
        let pages = source.fetch_pages().await.unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_options_from_config() {
        let config = SiteConfig {
            url: "https://example.com".to_string(),
            max_pages: 12,
            ..SiteConfig::default()
        };
        let opts = CrawlOptions::from_config(&config).unwrap();

        assert_eq!(opts.limit, 12);
        assert_eq!(opts.max_depth, 5);
        assert!(!opts.filter.allows("https://example.com/admin/x"));
    }
}
