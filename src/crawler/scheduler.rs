//! Scheduler for managing the crawl frontier and request pacing
//!
//! This module handles:
//! - The shared FIFO frontier of URLs to fetch
//! - Depth and dedup checks when links are offered
//! - Global concurrency limiting via a semaphore
//! - The politeness delay (fixed plus random jitter) before each request

use crate::config::CrawlerConfig;
use crate::state::VisitedSet;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A URL queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The URL to fetch, exactly as discovered
    pub url: String,

    /// Hops from the start URL (the start URL is depth 0)
    pub depth: u32,
}

/// Outcome of offering a discovered URL to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// New URL within the depth bound; now queued
    Enqueued,
    /// Already claimed by an earlier discovery
    AlreadyVisited,
    /// Beyond the maximum depth; never fetched
    TooDeep,
    /// The crawl is draining and takes no new work
    Closed,
}

/// Shared frontier queue
///
/// Once closed, pushes are rejected; items already queued stay poppable
/// but the coordinator stops dispatching them.
#[derive(Debug, Default)]
struct Frontier {
    queue: Mutex<VecDeque<QueuedUrl>>,
    closed: AtomicBool,
}

impl Frontier {
    fn push(&self, item: QueuedUrl) -> bool {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        queue.push_back(item);
        true
    }

    fn pop(&self) -> Option<QueuedUrl> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn close(&self) {
        let _queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Scheduler manages the frontier and request pacing
///
/// The scheduler coordinates:
/// - Global concurrency limits (`parallelism` permits)
/// - Depth limits (links deeper than `max_depth` are never queued)
/// - Deduplication through the shared [`VisitedSet`]
/// - The delay applied before every request
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// URLs waiting for a worker
    frontier: Frontier,

    /// URLs claimed so far, shared with the coordinator
    visited: Arc<VisitedSet>,

    /// Maximum hop depth from the start URL
    max_depth: u32,

    /// Fixed delay before each request
    delay: Duration,

    /// Upper bound of the random jitter added to `delay`
    random_delay: Duration,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `visited` - The shared visited set
    pub fn new(config: &CrawlerConfig, visited: Arc<VisitedSet>) -> Self {
        let parallelism = config.parallelism.max(1) as usize;

        Self {
            semaphore: Arc::new(Semaphore::new(parallelism)),
            frontier: Frontier::default(),
            visited,
            max_depth: config.max_depth,
            delay: Duration::from_millis(config.delay_ms),
            random_delay: Duration::from_millis(config.random_delay_ms),
        }
    }

    /// Raises the fixed delay to at least `minimum`
    ///
    /// Used to honour a robots.txt `Crawl-delay` larger than the configured one.
    pub fn raise_delay(&mut self, minimum: Duration) {
        if minimum > self.delay {
            tracing::info!(
                "Raising request delay from {:?} to {:?} (robots.txt crawl-delay)",
                self.delay,
                minimum
            );
            self.delay = minimum;
        }
    }

    /// Queues the start URL at depth 0
    pub fn seed(&self, url: &str) -> Offer {
        self.offer(url, 0)
    }

    /// Offers a discovered URL at the given depth
    ///
    /// The depth check runs before the visited check, so a URL first seen
    /// too deep can still be queued later from a shallower page.
    pub fn offer(&self, url: &str, depth: u32) -> Offer {
        if self.frontier.is_closed() {
            return Offer::Closed;
        }

        if depth > self.max_depth {
            return Offer::TooDeep;
        }

        if !self.visited.mark_new(url) {
            return Offer::AlreadyVisited;
        }

        let queued = QueuedUrl {
            url: url.to_string(),
            depth,
        };

        if self.frontier.push(queued) {
            tracing::trace!("Queued {} at depth {}", url, depth);
            Offer::Enqueued
        } else {
            Offer::Closed
        }
    }

    /// Takes the next URL to fetch, if any
    pub fn next_url(&self) -> Option<QueuedUrl> {
        if self.frontier.is_closed() {
            return None;
        }
        self.frontier.pop()
    }

    /// Waits for a worker slot
    ///
    /// Returns `None` only if the semaphore has been closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().acquire_owned().await.ok()
    }

    /// Delay to wait before the next request: fixed delay plus random jitter
    pub fn politeness_delay(&self) -> Duration {
        let jitter_ms = self.random_delay.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        let jitter = rand::thread_rng().gen_range(0..=jitter_ms);
        self.delay + Duration::from_millis(jitter)
    }

    /// Stops accepting new frontier entries
    pub fn close(&self) {
        self.frontier.close();
    }

    /// Returns true once the scheduler has been closed
    pub fn is_closed(&self) -> bool {
        self.frontier.is_closed()
    }

    /// Number of URLs waiting for a worker
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Number of worker slots currently free
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
