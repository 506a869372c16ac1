/// Crawl phase definitions
///
/// `WorkerState` follows one unit of work through a worker slot;
/// `CrawlPhase` tracks the crawl as a whole.
use std::fmt;

/// State of a single worker slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting for a frontier item
    Idle,

    /// Request in flight
    Fetching,

    /// Building the HTML document
    Parsing,

    /// Running the page extractor
    Extracting,

    /// Collecting and offering outgoing links
    Discovering,

    /// Slot released; no further work will be taken
    Done,
}

impl WorkerState {
    /// Returns true if moving from `self` to `next` is a legal step
    ///
    /// Any state may fall back to `Idle` (the unit of work was abandoned)
    /// or go to `Done` (the crawl is draining).
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;

        if *self == Done {
            return false;
        }

        matches!(
            (self, next),
            (_, Idle)
                | (_, Done)
                | (Idle, Fetching)
                | (Fetching, Parsing)
                | (Parsing, Extracting)
                | (Extracting, Discovering)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Extracting => "extracting",
            Self::Discovering => "discovering",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Frontier items are being dispatched
    Running,

    /// Deadline passed: nothing new is dispatched, in-flight work finishes
    Draining,

    /// No work in flight; results are frozen
    Finished,
}

impl CrawlPhase {
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Draining)
                | (Self::Running, Self::Finished)
                | (Self::Draining, Self::Finished)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
