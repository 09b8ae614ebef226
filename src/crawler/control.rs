//! Run state, counters and the external control surface of a crawl

use crate::crawler::frontier::Frontier;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Lifecycle state of a crawl run
///
/// `Running` and `Paused` toggle; `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Running,
    Paused,
    Stopped,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

/// Monotonic per-run counters
#[derive(Debug, Default)]
pub(crate) struct Counters {
    fetched: AtomicU64,
    filtered: AtomicU64,
    errors: AtomicU64,
    discovered: AtomicU64,
    out_of_scope: AtomicU64,
    excluded: AtomicU64,
    depth_limited: AtomicU64,
}

/// Which counter an event increments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Fetched,
    Filtered,
    Error,
    Discovered,
    OutOfScope,
    Excluded,
    DepthLimited,
}

impl Counters {
    fn counter(&self, event: Event) -> &AtomicU64 {
        match event {
            Event::Fetched => &self.fetched,
            Event::Filtered => &self.filtered,
            Event::Error => &self.errors,
            Event::Discovered => &self.discovered,
            Event::OutOfScope => &self.out_of_scope,
            Event::Excluded => &self.excluded,
            Event::DepthLimited => &self.depth_limited,
        }
    }

    fn load(&self, event: Event) -> u64 {
        self.counter(event).load(Ordering::Relaxed)
    }
}

/// Shared run state: the state channel plus counters
#[derive(Debug)]
pub(crate) struct RunControl {
    state: watch::Sender<RunState>,
    counters: Counters,
    started_at: DateTime<Utc>,
}

impl RunControl {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::Running);
        Self {
            state,
            counters: Counters::default(),
            started_at: Utc::now(),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn record(&self, event: Event) {
        self.counters.counter(event).fetch_add(1, Ordering::Relaxed);
    }

    /// `Running -> Paused`; returns false from any other state
    pub fn pause(&self) -> bool {
        self.transition(RunState::Running, RunState::Paused)
    }

    /// `Paused -> Running`; returns false from any other state
    pub fn resume(&self) -> bool {
        self.transition(RunState::Paused, RunState::Running)
    }

    /// Moves to `Stopped`; returns false if already stopped
    pub fn stop(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == RunState::Stopped {
                false
            } else {
                *state = RunState::Stopped;
                true
            }
        })
    }

    fn transition(&self, from: RunState, to: RunState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    pub fn snapshot(&self, pending: usize) -> CrawlStatus {
        let elapsed = (Utc::now() - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        CrawlStatus {
            state: self.state(),
            fetched: self.counters.load(Event::Fetched),
            filtered: self.counters.load(Event::Filtered),
            errors: self.counters.load(Event::Error),
            discovered: self.counters.load(Event::Discovered),
            out_of_scope: self.counters.load(Event::OutOfScope),
            excluded: self.counters.load(Event::Excluded),
            depth_limited: self.counters.load(Event::DepthLimited),
            pending,
            started_at: self.started_at,
            elapsed,
        }
    }
}

/// Point-in-time view of a crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatus {
    pub state: RunState,

    /// Resources returned by the fetcher
    pub fetched: u64,

    /// Fetched resources the parse filter declined to mine
    pub filtered: u64,

    /// Transport failures
    pub errors: u64,

    /// Tasks accepted into the frontier, seeds included
    pub discovered: u64,

    /// Links rejected by the scope boundary
    pub out_of_scope: u64,

    /// Links matching a skip pattern
    pub excluded: u64,

    /// In-scope links beyond the maximum depth
    pub depth_limited: u64,

    /// Tasks waiting in the frontier
    pub pending: usize,

    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Cloneable handle for pausing, resuming, stopping and observing a run
#[derive(Debug, Clone)]
pub struct CrawlController {
    control: Arc<RunControl>,
    frontier: Arc<Frontier>,
}

impl CrawlController {
    pub(crate) fn new(control: Arc<RunControl>, frontier: Arc<Frontier>) -> Self {
        Self { control, frontier }
    }

    /// Stops workers from taking new tasks; in-flight fetches complete
    pub fn pause(&self) -> bool {
        let changed = self.control.pause();
        if changed {
            tracing::info!("Crawl paused");
        }
        changed
    }

    /// Lets workers take tasks again after a pause
    pub fn resume(&self) -> bool {
        let changed = self.control.resume();
        if changed {
            tracing::info!("Crawl resumed");
        }
        changed
    }

    /// Ends the run; workers finish their current task and exit
    ///
    /// Remaining frontier entries are not fetched.
    pub fn stop(&self) -> bool {
        let changed = self.control.stop();
        if changed {
            tracing::info!("Crawl stop requested");
        }
        changed
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }

    pub fn status(&self) -> CrawlStatus {
        self.control.snapshot(self.frontier.len())
    }
}
