//! Include/exclude path globs applied to crawled URLs.
//!
//! Globs are matched against the URL path only: `*` matches any run of
//! characters (including `/`), `?` matches exactly one, everything else is
//! literal, and the whole path must match.
//!
//! ```rust
//! use llmsmap_core::crawl::UrlFilter;
//!
//! let filter = UrlFilter::new(&["/docs/*"], &["/docs/internal/*"])?;
//! assert!(filter.allows("https://example.com/docs/intro"));
//! assert!(!filter.allows("https://example.com/docs/internal/notes"));
//! assert!(!filter.allows("https://example.com/blog/post"));
//! # Ok::<(), llmsmap_core::Error>(())
//! ```

use regex::Regex;
use url::Url;

use crate::{Error, Result};

/// Compiled include/exclude globs.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl UrlFilter {
    /// Compile include and exclude globs. An empty include list admits every path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a glob produces an invalid expression.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Whether `url` passes the filter.
    ///
    /// URLs that do not parse match no glob: they are rejected when an
    /// include list is set and never excluded otherwise.
    #[must_use]
    pub fn allows(&self, url: &str) -> bool {
        let path = Url::parse(url).ok().map(|u| u.path().to_string());
        let matches_any = |globs: &[Regex]| {
            path.as_deref()
                .is_some_and(|p| globs.iter().any(|re| re.is_match(p)))
        };

        (self.include.is_empty() || matches_any(&self.include)) && !matches_any(&self.exclude)
    }
}

fn compile_all<S: AsRef<str>>(globs: &[S]) -> Result<Vec<Regex>> {
    globs.iter().map(|g| glob_to_regex(g.as_ref())).collect()
}

fn glob_to_regex(glob: &str) -> Result<Regex> {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| Error::Config(format!("invalid path glob '{glob}': {e}")))
}
