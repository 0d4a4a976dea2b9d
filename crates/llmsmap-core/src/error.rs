//! Error types and handling for llmsmap-core operations.
//!
//! A single error enum covers generation (crawling, processing, writing the
//! output directory) and retrieval (loading the manifest, reading content).
//! Errors are categorized for logging and carry a recoverability hint for
//! retry logic around the crawl client.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: content files, manifest and index writes
//! - **Network Errors**: Firecrawl API requests
//! - **Parse Errors**: scraped payloads, query strings
//! - **Configuration Errors**: invalid `llmsmap.toml` or flags
//! - **Crawl Errors**: the page-acquisition service rejected or failed a crawl
//!
//! ```rust
//! use llmsmap_core::{Error, Result};
//!
//! fn handle(result: Result<()>) {
//!     match result {
//!         Err(e) if e.is_recoverable() => eprintln!("retrying after: {e}"),
//!         Err(e) => eprintln!("[{}] {e}", e.category()),
//!         Ok(()) => {},
//!     }
//! }
//! # handle(Ok(()));
//! ```

use thiserror::Error;

/// The main error type for llmsmap-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading content files and writing the generated output
    /// directory. Timeouts and interruptions are considered recoverable.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Covers requests against the Firecrawl API. Connection and timeout
    /// errors are recoverable, everything else is permanent.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Parsing operation failed.
    ///
    /// Raised for malformed scraped-page files and unexpected payloads
    /// from the crawl service.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Invalid TOML syntax in `llmsmap.toml`
    /// - Missing site URL
    /// - Values outside valid ranges (e.g. `max_pages = 0`)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource was not found.
    ///
    /// Used when the manifest is absent from the content store.
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL is malformed or invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Operation timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization or deserialization failed.
    ///
    /// Covers manifest JSON and config TOML conversion.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The crawl service reported a failed crawl job.
    ///
    /// ## Recoverability
    ///
    /// Typically recoverable - a fresh crawl may succeed.
    #[error("Crawl failed: {reason}")]
    CrawlFailed {
        /// Reason reported by the crawl service.
        reason: String,
    },

    /// The crawl service rejected the API key.
    ///
    /// ## Resolution
    ///
    /// Pass `--key` or set `FIRECRAWL_API_KEY`.
    #[error("Firecrawl API key rejected. Use --key or set FIRECRAWL_API_KEY")]
    CrawlNotAuthenticated,

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// ```rust
    /// use llmsmap_core::Error;
    /// use std::io;
    ///
    /// assert!(Error::Timeout("crawl poll".to_string()).is_recoverable());
    /// assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "eintr")).is_recoverable());
    /// assert!(!Error::Config("missing url".to_string()).is_recoverable());
    /// assert!(!Error::CrawlNotAuthenticated.is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout(_) | Self::CrawlFailed { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a stable string identifier.
    ///
    /// Used as a structured field when logging failures.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Timeout(_) => "timeout",
            Self::Serialization(_) => "serialization",
            Self::CrawlFailed { .. } | Self::CrawlNotAuthenticated => "crawl",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        // Given: Different error variants
        let cases = vec![
            (Error::Parse("bad payload".to_string()), "Parse error"),
            (Error::Config("missing url".to_string()), "Configuration error"),
            (Error::NotFound("manifest.json".to_string()), "Not found"),
            (Error::InvalidUrl("nope".to_string()), "Invalid URL"),
            (Error::Timeout("poll".to_string()), "Timeout"),
            (
                Error::CrawlFailed {
                    reason: "job failed".to_string(),
                },
                "Crawl failed",
            ),
        ];

        for (error, prefix) in cases {
            // When: Converting to string
            let rendered = error.to_string();

            // Then: The category prefix is present
            assert!(rendered.contains(prefix), "{rendered} lacks {prefix}");
        }

        assert_eq!(Error::Other("plain".to_string()).to_string(), "plain");
    }

    #[test]
    fn test_error_from_io_error() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        match err {
            Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("Expected IO error variant, got {other:?}"),
        }
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: Error = parse.unwrap_err().into();
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(Error::Io(io::Error::other("x")).category(), "io");
        assert_eq!(Error::Parse(String::new()).category(), "parse");
        assert_eq!(Error::Config(String::new()).category(), "config");
        assert_eq!(Error::NotFound(String::new()).category(), "not_found");
        assert_eq!(Error::CrawlNotAuthenticated.category(), "crawl");
        assert_eq!(
            Error::CrawlFailed {
                reason: String::new()
            }
            .category(),
            "crawl"
        );
        assert_eq!(Error::Other(String::new()).category(), "other");
    }

    #[test]
    fn test_error_recoverability() {
        let recoverable = vec![
            Error::Timeout("t".to_string()),
            Error::CrawlFailed {
                reason: "r".to_string(),
            },
            Error::Io(io::Error::new(io::ErrorKind::TimedOut, "t")),
        ];
        let permanent = vec![
            Error::Parse("p".to_string()),
            Error::Config("c".to_string()),
            Error::NotFound("n".to_string()),
            Error::CrawlNotAuthenticated,
            Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "p")),
        ];

        for e in recoverable {
            assert!(e.is_recoverable(), "{e:?} should be recoverable");
        }
        for e in permanent {
            assert!(!e.is_recoverable(), "{e:?} should be permanent");
        }
    }

    proptest! {
        #[test]
        fn test_config_error_with_arbitrary_messages(msg in r".{0,200}") {
            let error = Error::Config(msg.clone());
            let rendered = error.to_string();

            prop_assert!(rendered.contains("Configuration error"));
            prop_assert!(rendered.contains(&msg));
            prop_assert!(!error.is_recoverable());
        }
    }
}
