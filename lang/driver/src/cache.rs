use std::path::{Path, PathBuf};

use moonc_lang_ast::HashMap;

/// Results of one phase, per input file.
pub struct Cache<T> {
    entries: HashMap<PathBuf, CacheEntry<T>>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self { entries: HashMap::default() }
    }
}

impl<T> Cache<T> {
    /// Get the value associated with a path regardless of staleness
    pub fn get_even_if_stale(&self, path: &Path) -> Option<&T> {
        self.entries.get(path).map(|entry| entry.value())
    }

    /// Get the value associated with a path if it is not stale
    pub fn get_unless_stale(&self, path: &Path) -> Option<&T> {
        if self.is_stale(path) { None } else { self.get_even_if_stale(path) }
    }

    pub fn insert(&mut self, path: PathBuf, value: T) {
        self.entries.insert(path, CacheEntry::from(value));
    }

    pub fn is_stale(&self, path: &Path) -> bool {
        self.entries.get(path).map(|entry| entry.stale).unwrap_or(true)
    }

    pub fn invalidate(&mut self, path: &Path) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.stale = true;
        }
    }
}

pub struct CacheEntry<T> {
    value: T,
    stale: bool,
}

impl<T> CacheEntry<T> {
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> From<T> for CacheEntry<T> {
    fn from(value: T) -> Self {
        Self { value, stale: false }
    }
}
