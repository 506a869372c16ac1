//! Crawl statistics
//!
//! Workers bump lock-free counters while the crawl runs; the coordinator
//! freezes them into a [`CrawlStatistics`] snapshot when it finishes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Live counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pages_scraped: AtomicUsize,
    fetch_errors: AtomicUsize,
    non_articles: AtomicUsize,
    robots_denied: AtomicUsize,
    links_enqueued: AtomicUsize,
    links_too_deep: AtomicUsize,
}

/// Which counter to bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    PagesScraped,
    FetchErrors,
    NonArticles,
    RobotsDenied,
    LinksEnqueued,
    LinksTooDeep,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&self, counter: Counter) {
        self.slot(counter).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> usize {
        self.slot(counter).load(Ordering::Relaxed)
    }

    fn slot(&self, counter: Counter) -> &AtomicUsize {
        match counter {
            Counter::PagesScraped => &self.pages_scraped,
            Counter::FetchErrors => &self.fetch_errors,
            Counter::NonArticles => &self.non_articles,
            Counter::RobotsDenied => &self.robots_denied,
            Counter::LinksEnqueued => &self.links_enqueued,
            Counter::LinksTooDeep => &self.links_too_deep,
        }
    }

    /// Freezes the counters into a statistics snapshot
    pub fn snapshot(&self, urls_visited: usize, elapsed: Duration, timed_out: bool) -> CrawlStatistics {
        CrawlStatistics {
            pages_scraped: self.get(Counter::PagesScraped),
            urls_visited,
            fetch_errors: self.get(Counter::FetchErrors),
            non_articles: self.get(Counter::NonArticles),
            robots_denied: self.get(Counter::RobotsDenied),
            links_enqueued: self.get(Counter::LinksEnqueued),
            links_too_deep: self.get(Counter::LinksTooDeep),
            elapsed,
            timed_out,
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Article pages extracted into records
    pub pages_scraped: usize,

    /// URLs claimed in the visited set (queued at least once)
    pub urls_visited: usize,

    /// Fetches that failed (HTTP, network, timeout, content type)
    pub fetch_errors: usize,

    /// Pages fetched but without an article container
    pub non_articles: usize,

    /// URLs skipped because robots.txt disallowed them
    pub robots_denied: usize,

    /// Links accepted into the frontier (including the start URL)
    pub links_enqueued: usize,

    /// Links discovered beyond the maximum depth
    pub links_too_deep: usize,

    /// Wall-clock duration of the crawl phase
    pub elapsed: Duration,

    /// True if the crawl deadline cut the crawl short
    pub timed_out: bool,
}

impl CrawlStatistics {
    /// Pages per second over the crawl phase
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.pages_scraped as f64 / secs
    }
}

/// Prints statistics in a human-readable format
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");
    println!("Pages scraped:       {}", stats.pages_scraped);
    println!("URLs visited:        {}", stats.urls_visited);
    println!("Fetch errors:        {}", stats.fetch_errors);
    println!("Non-article pages:   {}", stats.non_articles);
    if stats.robots_denied > 0 {
        println!("Denied by robots:    {}", stats.robots_denied);
    }
    println!("Links enqueued:      {}", stats.links_enqueued);
    println!("Links beyond depth:  {}", stats.links_too_deep);
    println!(
        "Elapsed:             {:.1}s ({:.2} pages/sec)",
        stats.elapsed.as_secs_f64(),
        stats.rate()
    );
    if stats.timed_out {
        println!("Stopped early:       crawl deadline reached");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = CrawlCounters::new();
        counters.incr(Counter::PagesScraped);
        counters.incr(Counter::PagesScraped);
        counters.incr(Counter::FetchErrors);
        counters.incr(Counter::LinksTooDeep);

        let stats = counters.snapshot(5, Duration::from_secs(2), true);
        assert_eq!(stats.pages_scraped, 2);
        assert_eq!(stats.fetch_errors, 1);
        assert_eq!(stats.links_too_deep, 1);
        assert_eq!(stats.urls_visited, 5);
        assert!(stats.timed_out);
    }

    #[test]
    fn test_rate() {
        let stats = CrawlStatistics {
            pages_scraped: 10,
            elapsed: Duration::from_secs(4),
            ..Default::default()
        };
        assert!((stats.rate() - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_rate_zero_elapsed() {
        let stats = CrawlStatistics::default();
        assert_eq!(stats.rate(), 0.0);
    }
}
