//! Transport-neutral fetch endpoint.
//!
//! [`FetchHandler`] turns query parameters into a [`FetchResponse`]
//! (status, headers, body) so any HTTP server or serverless runtime can
//! wrap it.
//!
//! | parameter | meaning |
//! |---|---|
//! | `sections` | comma-separated paths, `*` wildcards allowed |
//! | `search` | keyword query |
//! | `format` | `md` (default), `txt` or `json` |
//! | `updated_after` | `YYYY-MM-DD`, strictly-after filter |
//! | `limit` | max search results (default 10) |
//!
//! Exactly one of `sections` and `search` must be given.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use super::format::{CONTENT_TYPE_JSON, ResponseFormat, format_response};
use super::resolver::{DEFAULT_SEARCH_LIMIT, ResolvedSection, SectionFilters, SectionResolver};
use super::store::ContentStore;
use crate::generate::{MANIFEST_FILE, Manifest};
use crate::{Error, Result};

/// Error message when neither selector is supplied.
pub const MISSING_SELECTOR: &str = "sections or search parameter required";
/// Error message when both selectors are supplied.
pub const CONFLICTING_SELECTORS: &str = "use either sections or search, not both";

/// Parsed fetch parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// Path patterns; empty when absent.
    pub sections: Vec<String>,
    /// Search query, if any.
    pub search: Option<String>,
    /// Response representation.
    pub format: ResponseFormat,
    /// Strictly-after date filter.
    pub updated_after: Option<String>,
    /// Search result limit.
    pub limit: Option<usize>,
}

impl FetchRequest {
    /// Parse a URL query string (with or without the leading `?`).
    ///
    /// Unknown formats fall back to markdown and invalid limits to the
    /// default; repeated keys keep the last value.
    ///
    /// ```rust
    /// use llmsmap_core::retrieval::{FetchRequest, ResponseFormat};
    ///
    /// let req = FetchRequest::from_query("?sections=/docs/*,%20/pricing&format=json");
    /// assert_eq!(req.sections, vec!["/docs/*", "/pricing"]);
    /// assert_eq!(req.format, ResponseFormat::Json);
    /// ```
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut request = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "sections" => request.sections = split_sections(&value),
                "search" => {
                    let trimmed = value.trim();
                    request.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
                },
                "format" => request.format = ResponseFormat::parse_lossy(&value),
                "updated_after" => {
                    let trimmed = value.trim();
                    request.updated_after = (!trimmed.is_empty()).then(|| trimmed.to_string());
                },
                "limit" => request.limit = value.trim().parse().ok().filter(|n| *n > 0),
                other => debug!(param = %other, "Ignoring unknown fetch parameter"),
            }
        }

        request
    }

    fn filters(&self) -> SectionFilters {
        SectionFilters {
            updated_after: self.updated_after.clone(),
        }
    }
}

fn split_sections(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Transport-neutral response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: String,
}

impl FetchResponse {
    fn new(status: u16, content_type: &str, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status,
            headers,
            body,
        }
    }

    fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status, CONTENT_TYPE_JSON, body)
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Header value by exact name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Lazily loaded manifest owned by one handler.
///
/// The first successful load is kept for the cache's lifetime; a failed
/// load leaves the slot empty so a later call retries.
#[derive(Debug, Default)]
pub struct ManifestCache {
    slot: OnceCell<Arc<Manifest>>,
}

impl ManifestCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached manifest, if loaded.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Manifest>> {
        self.slot.get().cloned()
    }

    /// Return the cached manifest, loading it from `store` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the store has no manifest, or
    /// [`Error::Serialization`] if it cannot be parsed.
    pub fn get_or_load<S: ContentStore + ?Sized>(&self, store: &S) -> Result<Arc<Manifest>> {
        self.slot
            .get_or_try_init(|| {
                let json = store
                    .read(MANIFEST_FILE)?
                    .ok_or_else(|| Error::NotFound(MANIFEST_FILE.to_string()))?;
                let manifest = Manifest::from_json(&json)?;
                debug!(sections = manifest.sections.len(), "Loaded manifest");
                Ok(Arc::new(manifest))
            })
            .cloned()
    }
}

/// Fetch endpoint bound to one content store.
#[derive(Debug)]
pub struct FetchHandler<S> {
    store: S,
    cache: ManifestCache,
    cors: bool,
}

impl<S: ContentStore> FetchHandler<S> {
    /// Create a handler with CORS headers enabled.
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: ManifestCache::new(),
            cors: true,
        }
    }

    /// Enable or disable CORS headers.
    #[must_use]
    pub fn with_cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }

    /// The handler's manifest cache.
    pub const fn cache(&self) -> &ManifestCache {
        &self.cache
    }

    /// Parse `query` and handle it.
    pub fn handle_query(&self, query: &str) -> FetchResponse {
        self.handle(&FetchRequest::from_query(query))
    }

    /// Handle a parsed request.
    pub fn handle(&self, request: &FetchRequest) -> FetchResponse {
        let response = self.dispatch(request);
        self.finish(response)
    }

    /// Response to a CORS preflight request.
    pub fn preflight(&self) -> FetchResponse {
        self.finish(FetchResponse {
            status: 204,
            headers: BTreeMap::new(),
            body: String::new(),
        })
    }

    fn dispatch(&self, request: &FetchRequest) -> FetchResponse {
        let has_sections = !request.sections.is_empty();
        match (has_sections, request.search.as_deref()) {
            (false, None) => return FetchResponse::error(400, MISSING_SELECTOR),
            (true, Some(_)) => return FetchResponse::error(400, CONFLICTING_SELECTORS),
            _ => {},
        }

        let manifest = match self.cache.get_or_load(&self.store) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, category = e.category(), "Failed to load manifest");
                return FetchResponse::error(500, &format!("failed to load manifest: {e}"));
            },
        };

        let resolver = SectionResolver::new(manifest, &self.store);
        let filters = request.filters();
        let sections: Vec<ResolvedSection> = match request.search.as_deref() {
            Some(query) => resolver
                .search_sections(
                    query,
                    &filters,
                    request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
                )
                .into_iter()
                .map(|hit| hit.section)
                .collect(),
            None => resolver.resolve_sections(&request.sections, &filters),
        };

        match format_response(&sections, request.format) {
            Ok(formatted) => FetchResponse::new(200, formatted.content_type, formatted.body),
            Err(e) => {
                warn!(error = %e, "Failed to format response");
                FetchResponse::error(500, &e.to_string())
            },
        }
    }

    fn finish(&self, mut response: FetchResponse) -> FetchResponse {
        if self.cors {
            response
                .headers
                .insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
            response.headers.insert(
                "Access-Control-Allow-Methods".to_string(),
                "GET, OPTIONS".to_string(),
            );
        }
        response
    }
}
