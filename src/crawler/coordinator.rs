//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties everything together:
//! - Seeding the frontier with the start URL
//! - Dispatching frontier items to a bounded pool of worker tasks
//! - Fetch, parse, extract, and link discovery inside each worker
//! - The crawl deadline and the drain that follows it
//!
//! A worker never holds a parsed document across an `.await`: parsing,
//! extraction and discovery run in one synchronous step after the body has
//! been downloaded.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url};
use crate::crawler::scheduler::{Offer, QueuedUrl, Scheduler};
use crate::extract::{discover_links, extract, PageRecord, Selectors};
use crate::output::stats::{Counter, CrawlCounters, CrawlStatistics};
use crate::robots::{fetch_robots, ParsedRobots};
use crate::state::{sort_by_url, CrawlPhase, PageStore, VisitedSet, WorkerState};
use crate::url::{is_same_host, parse_origin};
use crate::ScraperError;
use reqwest::Client;
use scraper::Html;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Extracted pages, sorted ascending by URL
    pub pages: Vec<PageRecord>,

    /// Counters gathered while crawling
    pub stats: CrawlStatistics,
}

/// Everything a worker task needs, shared between all of them
struct CrawlContext {
    client: Client,
    origin: Url,
    scheduler: Scheduler,
    store: PageStore,
    selectors: Selectors,
    robots: ParsedRobots,
    robots_agent: String,
    counters: CrawlCounters,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    origin: Url,
    client: Client,
    selectors: Selectors,
    visited: Arc<VisitedSet>,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(ScraperError)` - Bad start URL, selectors, or HTTP client setup
    pub fn new(config: Config) -> Result<Self, ScraperError> {
        let origin = parse_origin(&config.crawler.start_url)?;
        let selectors = Selectors::from_config(&config.extraction)?;
        let client = build_http_client(&config)?;

        Ok(Self {
            config: Arc::new(config),
            origin,
            client,
            selectors,
            visited: Arc::new(VisitedSet::new()),
            phase: CrawlPhase::Running,
        })
    }

    /// Current global phase
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the crawl until the frontier is exhausted or the deadline passes
    pub async fn run(self) -> Result<CrawlOutcome, ScraperError> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Runs the crawl with an external drain signal
    ///
    /// Cancelling `cancel` has the same effect as the crawl deadline firing:
    /// no new URL is dispatched, in-flight fetches finish, and the pages
    /// collected so far are returned.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - At least one page was extracted
    /// * `Err(ScraperError::NoPages)` - Nothing to render
    pub async fn run_with_cancellation(
        mut self,
        cancel: CancellationToken,
    ) -> Result<CrawlOutcome, ScraperError> {
        let start_time = Instant::now();
        let timeout = Duration::from_secs(self.config.crawler.timeout_secs);
        let timed_out = Arc::new(AtomicBool::new(false));
        let deadline = spawn_deadline(timeout, cancel.clone(), Arc::clone(&timed_out));

        tracing::info!(
            "Starting crawl of {} (max depth {}, parallelism {}, timeout {:?})",
            self.origin,
            self.config.crawler.max_depth,
            self.config.crawler.parallelism,
            timeout
        );

        let ctx = Arc::new(self.build_context().await);

        let start_url = self.config.crawler.start_url.trim().to_string();
        if ctx.scheduler.seed(&start_url) == Offer::Enqueued {
            ctx.counters.incr(Counter::LinksEnqueued);
        }

        let mut tasks: JoinSet<WorkerState> = JoinSet::new();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if let Some(queued) = ctx.scheduler.next_url() {
                let permit = tokio::select! {
                    permit = ctx.scheduler.acquire() => permit,
                    _ = cancel.cancelled() => None,
                };
                let Some(permit) = permit else {
                    break;
                };

                tracing::debug!("Dispatching {} (depth {})", queued.url, queued.depth);
                tasks.spawn(process_url(
                    Arc::clone(&ctx),
                    queued,
                    permit,
                    cancel.clone(),
                ));
                continue;
            }

            if tasks.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            tokio::select! {
                joined = tasks.join_next() => {
                    if let Some(result) = joined {
                        reap(result);
                    }
                }
                _ = cancel.cancelled() => {}
            }
        }

        if cancel.is_cancelled() {
            self.transition(CrawlPhase::Draining);
            ctx.scheduler.close();

            if timed_out.load(Ordering::SeqCst) {
                println!(
                    "\nScraping timed out after {} seconds. Processing collected pages...",
                    self.config.crawler.timeout_secs
                );
            }
            tracing::info!(
                "Draining {} in-flight request(s), {} URL(s) left unvisited",
                tasks.len(),
                ctx.scheduler.frontier_size()
            );
        }

        while let Some(result) = tasks.join_next().await {
            reap(result);
        }

        deadline.abort();
        self.transition(CrawlPhase::Finished);

        let stats = ctx.counters.snapshot(
            self.visited.len(),
            start_time.elapsed(),
            timed_out.load(Ordering::SeqCst),
        );

        let pages = match Arc::try_unwrap(ctx) {
            Ok(ctx) => ctx.store.into_sorted(),
            Err(ctx) => {
                let mut pages = ctx.store.snapshot();
                sort_by_url(&mut pages);
                pages
            }
        };

        tracing::info!(
            "Crawl finished: {} page(s) in {:?} ({} fetch error(s))",
            pages.len(),
            stats.elapsed,
            stats.fetch_errors
        );

        if pages.is_empty() {
            return Err(ScraperError::NoPages);
        }

        Ok(CrawlOutcome { pages, stats })
    }

    /// Builds the shared worker context, fetching robots.txt if enabled
    async fn build_context(&self) -> CrawlContext {
        let mut scheduler = Scheduler::new(&self.config.crawler, Arc::clone(&self.visited));
        let robots_agent = self.config.user_agent.crawler_name.clone();

        let robots = if self.config.crawler.respect_robots_txt {
            let robots = fetch_robots(&self.client, &self.origin).await;
            if let Some(delay) = robots.crawl_delay(&robots_agent) {
                scheduler.raise_delay(delay);
            }
            robots
        } else {
            ParsedRobots::allow_all()
        };

        CrawlContext {
            client: self.client.clone(),
            origin: self.origin.clone(),
            scheduler,
            store: PageStore::new(),
            selectors: self.selectors.clone(),
            robots,
            robots_agent,
            counters: CrawlCounters::new(),
        }
    }

    fn transition(&mut self, next: CrawlPhase) {
        if self.phase.can_transition_to(next) {
            tracing::debug!("Crawl phase {} -> {}", self.phase, next);
            self.phase = next;
        }
    }
}

/// Fires `cancel` once `timeout` has elapsed
fn spawn_deadline(
    timeout: Duration,
    cancel: CancellationToken,
    timed_out: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                timed_out.store(true, Ordering::SeqCst);
                tracing::warn!("Crawl deadline of {:?} reached, draining", timeout);
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    })
}

fn reap(result: Result<WorkerState, JoinError>) {
    match result {
        Ok(state) => tracing::trace!("Worker finished in state {}", state),
        Err(e) => tracing::error!("Worker task failed: {}", e),
    }
}

/// Tracks one unit of work through the worker states
struct WorkerSlot<'a> {
    url: &'a str,
    state: WorkerState,
}

impl<'a> WorkerSlot<'a> {
    fn new(url: &'a str) -> Self {
        Self {
            url,
            state: WorkerState::Idle,
        }
    }

    fn transition(&mut self, next: WorkerState) -> Result<(), ScraperError> {
        if !self.state.can_transition_to(next) {
            return Err(ScraperError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("{}: {} -> {}", self.url, self.state, next);
        self.state = next;
        Ok(())
    }
}

/// What a worker learned from one page
struct ParsedPage {
    record: Option<PageRecord>,
    links: Vec<String>,
}

/// Processes a single URL: delay, fetch, parse, extract, discover
///
/// Errors are logged here and never escape; the returned state is `Idle`
/// when the slot is free for more work and `Done` when the crawl is draining.
async fn process_url(
    ctx: Arc<CrawlContext>,
    queued: QueuedUrl,
    _permit: OwnedSemaphorePermit,
    cancel: CancellationToken,
) -> WorkerState {
    let mut slot = WorkerSlot::new(&queued.url);

    if let Err(e) = run_worker(&ctx, &queued, &mut slot, &cancel).await {
        ctx.counters.incr(Counter::FetchErrors);
        println!("Error scraping {}: {}", queued.url, e);
        tracing::warn!("Error scraping {}: {}", queued.url, e);
    }

    let end = if cancel.is_cancelled() {
        WorkerState::Done
    } else {
        WorkerState::Idle
    };
    // Every state may fall back to Idle or Done
    let _ = slot.transition(end);
    slot.state
}

async fn run_worker(
    ctx: &CrawlContext,
    queued: &QueuedUrl,
    slot: &mut WorkerSlot<'_>,
    cancel: &CancellationToken,
) -> Result<(), ScraperError> {
    let delay = ctx.scheduler.politeness_delay();
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = cancel.cancelled() => {
            tracing::debug!("Skipping {}: crawl is draining", queued.url);
            return Ok(());
        }
    }

    if !ctx.robots.is_allowed(&queued.url, &ctx.robots_agent) {
        tracing::info!("URL {} disallowed by robots.txt", queued.url);
        ctx.counters.incr(Counter::RobotsDenied);
        return Ok(());
    }

    slot.transition(WorkerState::Fetching)?;
    println!("Visiting {}", queued.url);

    let page = fetch_url(&ctx.client, &queued.url)
        .await
        .into_page(&queued.url)?;

    let final_url = Url::parse(&page.final_url)?;
    if !is_same_host(&final_url, &ctx.origin) {
        tracing::info!("{} redirected off-domain to {}, skipping", queued.url, final_url);
        return Ok(());
    }

    let parsed = parse_page(ctx, &queued.url, &page.body, slot)?;

    match parsed.record {
        Some(record) => {
            let total = ctx.store.push(record);
            ctx.counters.incr(Counter::PagesScraped);
            tracing::debug!("Extracted {} ({} page(s) so far)", queued.url, total);
        }
        None => {
            ctx.counters.incr(Counter::NonArticles);
            tracing::debug!("{} has no article content", queued.url);
        }
    }

    let next_depth = queued.depth + 1;
    for link in &parsed.links {
        match ctx.scheduler.offer(link, next_depth) {
            Offer::Enqueued => ctx.counters.incr(Counter::LinksEnqueued),
            Offer::TooDeep => ctx.counters.incr(Counter::LinksTooDeep),
            Offer::AlreadyVisited => {}
            Offer::Closed => break,
        }
    }

    Ok(())
}

/// Parses the body and runs extraction and link discovery
///
/// Kept synchronous so the parsed document never lives across an `.await`.
fn parse_page(
    ctx: &CrawlContext,
    url: &str,
    body: &str,
    slot: &mut WorkerSlot<'_>,
) -> Result<ParsedPage, ScraperError> {
    slot.transition(WorkerState::Parsing)?;
    let document = Html::parse_document(body);

    slot.transition(WorkerState::Extracting)?;
    let record = extract(&document, url, &ctx.selectors);

    slot.transition(WorkerState::Discovering)?;
    let links = discover_links(&document, &ctx.origin);

    Ok(ParsedPage { record, links })
}

/// Runs a complete crawl with the given configuration
///
/// # Example
///
/// ```no_run
/// use pdf_scraper::config::{resolve_config, ConfigOverrides};
/// use pdf_scraper::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let overrides = ConfigOverrides {
///     start_url: Some("https://go.dev/blog/".to_string()),
///     ..Default::default()
/// };
/// let (config, _) = resolve_config(None, overrides)?;
/// let outcome = run_crawl(config).await?;
/// println!("Scraped {} pages", outcome.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlOutcome, ScraperError> {
    Coordinator::new(config)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config(start_url: &str) -> Config {
        let mut config = Config::default();
        config.crawler.start_url = start_url.to_string();
        config.crawler.delay_ms = 0;
        config.crawler.random_delay_ms = 0;
        config
    }

    #[test]
    fn test_coordinator_rejects_bad_url() {
        let result = Coordinator::new(create_test_config("not a url"));
        assert!(matches!(result, Err(ScraperError::UrlError(_))));
    }

    #[test]
    fn test_coordinator_starts_running() {
        let coordinator = Coordinator::new(create_test_config("https://example.com/")).unwrap();
        assert_eq!(coordinator.phase(), CrawlPhase::Running);
    }

    #[test]
    fn test_worker_slot_rejects_skipped_step() {
        let mut slot = WorkerSlot::new("https://example.com/");
        assert!(slot.transition(WorkerState::Fetching).is_ok());
        assert!(matches!(
            slot.transition(WorkerState::Discovering),
            Err(ScraperError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_yields_no_pages() {
        let coordinator = Coordinator::new(create_test_config("http://127.0.0.1:9/")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = coordinator.run_with_cancellation(cancel).await;
        assert!(matches!(result, Err(ScraperError::NoPages)));
    }
}
