//! Wildcard path patterns.
//!
//! `*` matches a non-empty run of characters, path separators included, so
//! `/docs/*` selects every section below `/docs` at any depth but not
//! `/docs/` itself. All other characters are literal and the match is
//! anchored at both ends. Unlike shell globs, `*` does not stop at `/`.

/// Wildcard marker.
pub const WILDCARD: char = '*';

/// A compiled section selector.
///
/// ```rust
/// use llmsmap_core::retrieval::PathPattern;
///
/// let pattern = PathPattern::new("/docs/*");
/// assert!(pattern.matches("/docs/intro"));
/// assert!(pattern.matches("/docs/api/auth"));
/// assert!(!pattern.matches("/docs"));
/// assert!(!pattern.matches("/docs/"));
/// assert!(!pattern.matches("/blog/docs/intro"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    parts: Vec<String>,
}

impl PathPattern {
    /// Compile a pattern.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            raw: pattern.to_string(),
            parts: pattern.split(WILDCARD).map(ToString::to_string).collect(),
        }
    }

    /// Source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains a wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.parts.len() > 1
    }

    /// Anchored match against a full path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let [first, middle @ .., last] = self.parts.as_slice() else {
            return path == self.raw;
        };

        let Some(mut rest) = path.strip_prefix(first.as_str()) else {
            return false;
        };
        // Leftmost placement of each literal after at least one character
        // leaves the longest remainder for the parts that follow.
        for part in middle {
            let Some(skip) = rest.chars().next().map(char::len_utf8) else {
                return false;
            };
            let tail = &rest[skip..];
            match tail.find(part.as_str()) {
                Some(idx) => rest = &tail[idx + part.len()..],
                None => return false,
            }
        }
        rest.len() > last.len() && rest.ends_with(last.as_str())
    }
}
