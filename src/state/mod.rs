//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedSet`: URLs already claimed for fetching (dedup at discovery time)
//! - `PageStore`: extracted page records, appended by workers
//! - `WorkerState` / `CrawlPhase`: per-slot and global crawl phases

mod page_store;
mod phase;
mod visited;

// Re-export main types
pub use page_store::{sort_by_url, PageStore};
pub use phase::{CrawlPhase, WorkerState};
pub use visited::VisitedSet;
