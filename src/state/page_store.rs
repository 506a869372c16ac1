use crate::extract::PageRecord;
use std::sync::{Mutex, PoisonError};

/// Concurrency-safe, append-only collection of extracted pages
///
/// Workers push fully built records; the coordinator takes a sorted snapshot
/// once the crawl has finished. Arrival order is not meaningful.
#[derive(Debug, Default)]
pub struct PageStore {
    pages: Mutex<Vec<PageRecord>>,
}

impl PageStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns the new page count
    pub fn push(&self, record: PageRecord) -> usize {
        let mut pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
        pages.push(record);
        pages.len()
    }

    /// Number of records collected so far
    pub fn len(&self) -> usize {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clones the current contents in arrival order
    pub fn snapshot(&self) -> Vec<PageRecord> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consumes the store and returns its records sorted by URL
    pub fn into_sorted(self) -> Vec<PageRecord> {
        let mut pages = self.pages.into_inner().unwrap_or_else(PoisonError::into_inner);
        sort_by_url(&mut pages);
        pages
    }
}

/// Sorts records ascending by URL, byte-wise
pub fn sort_by_url(pages: &mut [PageRecord]) {
    pages.sort_by(|a, b| a.url().as_bytes().cmp(b.url().as_bytes()));
}
