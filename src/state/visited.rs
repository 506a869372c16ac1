use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Concurrency-safe set of URLs that have been claimed for fetching
///
/// The set only grows. A URL is claimed exactly once: the first caller of
/// [`VisitedSet::mark_new`] gets `true`, every later caller gets `false`,
/// no matter how many workers discover the same link at the same time.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    /// Creates an empty visited set
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks and marks a URL
    ///
    /// Returns `true` if the URL was not present and is now marked.
    pub fn mark_new(&self, url: &str) -> bool {
        let mut urls = self.urls.lock().unwrap_or_else(PoisonError::into_inner);
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    /// Returns true if the URL has already been claimed
    pub fn contains(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    /// Number of URLs claimed so far
    pub fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no URL has been claimed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
