//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and response classification
//! - The frontier, depth bound, and politeness delay
//! - Worker dispatch, the crawl deadline, and the drain that follows it

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use fetcher::{build_http_client, fetch_url, FetchResult, FetchedPage};
pub use scheduler::{Offer, QueuedUrl, Scheduler};

use crate::config::Config;
use crate::ScraperError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the origin and build the HTTP client
/// 2. Optionally fetch robots.txt
/// 3. Schedule and fetch pages up to the maximum depth
/// 4. Extract article content and follow same-host links
/// 5. Stop when the frontier is empty or `cancel` fires
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `cancel` - Drain signal (Ctrl-C in the binary)
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Pages sorted by URL plus statistics
/// * `Err(ScraperError)` - Setup failed or no page was scraped
pub async fn crawl(config: Config, cancel: CancellationToken) -> Result<CrawlOutcome, ScraperError> {
    Coordinator::new(config)?.run_with_cancellation(cancel).await
}
