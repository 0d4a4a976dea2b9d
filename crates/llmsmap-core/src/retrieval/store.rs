//! Content lookup for the retrieval path.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::Result;

/// Read access to persisted content by key.
///
/// Keys are paths relative to the output directory, such as
/// `manifest.json` or `content/docs/intro.md`. A missing key is `Ok(None)`,
/// never an error.
pub trait ContentStore: Send + Sync {
    /// Read the content stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error only for genuine read failures (permissions, invalid
    /// UTF-8), not for absent keys.
    fn read(&self, key: &str) -> Result<Option<String>>;
}

impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }
}

impl<T: ContentStore + ?Sized> ContentStore for &T {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }
}

/// Content store rooted at a generated output directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Create a store reading from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key to a path under the root; keys escaping it resolve to nothing.
    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        (contained && !key.is_empty()).then(|| self.root.join(relative))
    }
}

impl ContentStore for FsContentStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let Some(path) = self.resolve(key) else {
            return Ok(None);
        };
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory content store.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    entries: HashMap<String, String>,
}

impl MemoryContentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<String>) {
        self.entries.insert(key.into(), content.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(key, content);
        self
    }
}

impl ContentStore for MemoryContentStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }
}
