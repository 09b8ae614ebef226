//! Frontier queue and visited-set shared by all workers
//!
//! These are the only mutable state shared across workers. The visited-set's
//! insert is the single check-and-mark step that guarantees a canonical URL is
//! fetched at most once per run; the frontier's lock covers the pop/push pair and
//! the in-flight count used to detect natural termination.

use crate::crawler::control::RunState;
use crate::crawler::CrawlTask;
use dashmap::DashSet;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{watch, Mutex, Notify};

/// Canonical URLs already accepted in this run
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: DashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited; returns true only for the first caller
    pub fn insert(&self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        // `insert` is the atomic step; the `contains` above only avoids an allocation
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[derive(Debug, Default)]
struct Queue {
    tasks: VecDeque<CrawlTask>,
    in_flight: usize,
}

/// FIFO of pending crawl tasks with in-flight tracking
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<Queue>,
    pending: AtomicUsize,
    changed: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task and wakes idle workers
    pub async fn push(&self, task: CrawlTask) {
        {
            let mut queue = self.queue.lock().await;
            tracing::trace!("Frontier push: {} (depth {})", task.url, task.depth);
            queue.tasks.push_back(task);
            self.pending.store(queue.tasks.len(), Ordering::Relaxed);
        }
        self.changed.notify_waiters();
    }

    /// Takes the next task, waiting while the frontier is empty or the run is paused
    ///
    /// # Returns
    ///
    /// * `Some(CrawlTask)` - A task; the caller must call [`Frontier::complete`] after it
    /// * `None` - The run is stopped, or the frontier is empty with nothing in flight
    pub async fn pop(&self, state: &mut watch::Receiver<RunState>) -> Option<CrawlTask> {
        loop {
            // Register for wakeups before inspecting, so none are missed
            let changed = self.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            let current = *state.borrow_and_update();
            match current {
                RunState::Stopped => return None,
                RunState::Paused => {
                    if state.changed().await.is_err() {
                        return None;
                    }
                    continue;
                }
                RunState::Running => {}
            }

            {
                let mut queue = self.queue.lock().await;
                if let Some(task) = queue.tasks.pop_front() {
                    queue.in_flight += 1;
                    self.pending.store(queue.tasks.len(), Ordering::Relaxed);
                    return Some(task);
                }
                if queue.in_flight == 0 {
                    drop(queue);
                    // Let other idle workers observe the end too
                    self.changed.notify_waiters();
                    return None;
                }
            }

            tokio::select! {
                _ = &mut changed => {}
                result = state.changed() => {
                    if result.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    /// Marks a popped task as finished
    pub async fn complete(&self) {
        let idle = {
            let mut queue = self.queue.lock().await;
            queue.in_flight = queue.in_flight.saturating_sub(1);
            queue.tasks.is_empty() && queue.in_flight == 0
        };
        if idle {
            self.changed.notify_waiters();
        }
    }

    /// Number of tasks waiting to be popped
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
