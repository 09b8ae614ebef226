//! Worker pool driving a crawl run
//!
//! This module handles:
//! - Seeding the frontier from the configured seed URLs
//! - A fixed pool of workers sharing one frontier and one visited-set
//! - Resolving, canonicalizing and scope-checking every discovered link
//! - Streaming accepted tasks to the caller as they are discovered
//! - Natural termination, cooperative stop and the optional run time limit

use crate::config::Config;
use crate::crawler::control::{CrawlController, CrawlStatus, Event, RunControl, RunState};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::frontier::{Frontier, VisitedSet};
use crate::crawler::CrawlTask;
use crate::extract::{DefaultExtractor, LinkExtractor};
use crate::filter::{FetchFilter, FetchStatus, ParseDecision, ParseFilter};
use crate::url::{canonicalize_with, resolve, strip_fragment, CanonicalOptions};
use crate::CrawlError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use url::Url;

/// Read-only settings shared by every worker of a run
#[derive(Debug)]
struct RunSettings {
    seeds: Vec<String>,
    fetch_filter: FetchFilter,
    parse_filter: ParseFilter,
    canonical: CanonicalOptions,
    /// 0 means unlimited
    max_depth: u32,
    worker_count: usize,
    max_duration: Option<Duration>,
    seed_robots_txt: bool,
    seed_sitemap_xml: bool,
}

impl RunSettings {
    fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let spider = &config.spider;

        let fetch_filter = FetchFilter::from_seeds(config.scope.seeds.iter().map(String::as_str))?
            .with_always_in_scope(config.scope.always_in_scope.iter().cloned())
            .with_skip_patterns(config.compile_skip_patterns()?);

        Ok(Self {
            seeds: config.scope.seeds.clone(),
            fetch_filter,
            parse_filter: ParseFilter::new(spider.max_parse_size_bytes),
            canonical: config.canonical_options(),
            max_depth: spider.max_depth,
            worker_count: spider.worker_count.max(1) as usize,
            max_duration: (spider.max_duration_secs > 0)
                .then(|| Duration::from_secs(spider.max_duration_secs)),
            seed_robots_txt: spider.parse_robots_txt,
            seed_sitemap_xml: spider.parse_sitemap_xml,
        })
    }

    fn exceeds_max_depth(&self, depth: u32) -> bool {
        self.max_depth > 0 && depth > self.max_depth
    }

    /// Depth-0 tasks: each seed, then `/robots.txt` and `/sitemap.xml` of each
    /// seed origin when enabled
    fn seed_tasks(&self) -> Vec<CrawlTask> {
        let mut tasks = Vec::new();

        for seed in &self.seeds {
            let seed = seed.trim();
            match canonicalize_with(seed, None, &self.canonical) {
                Some(url) => {
                    tasks.push(CrawlTask::seed(url, strip_fragment(seed).to_string()))
                }
                None => tracing::warn!("Seed {} is not crawlable, skipping", seed),
            }
        }

        for seed in &self.seeds {
            let Ok(parsed) = Url::parse(seed.trim()) else {
                continue;
            };
            let origin = parsed.origin().ascii_serialization();
            let extras = [
                (self.seed_robots_txt, "/robots.txt"),
                (self.seed_sitemap_xml, "/sitemap.xml"),
            ];
            for (enabled, path) in extras {
                if !enabled {
                    continue;
                }
                let target = format!("{}{}", origin, path);
                if let Some(url) = canonicalize_with(&target, None, &self.canonical) {
                    tasks.push(CrawlTask::seed(url, target));
                }
            }
        }

        tasks
    }
}

/// A configured crawl, ready to be started once
///
/// # Example
///
/// ```no_run
/// use crawlscope::config::load_config;
/// use crawlscope::Crawler;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawlscope.toml"))?;
/// let crawler = Crawler::from_config(&config)?;
///
/// let mut handle = crawler.start().await?;
/// while let Some(task) = handle.next_task().await {
///     println!("{}", task);
/// }
/// let status = handle.wait().await?;
/// println!("fetched {} resources", status.fetched);
/// # Ok(())
/// # }
/// ```
pub struct Crawler {
    settings: Arc<RunSettings>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    started: AtomicBool,
}

impl Crawler {
    /// Creates a crawler with explicit fetcher and link extractor
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Scope and filters built from the configuration
    /// * `Err(CrawlError)` - A seed or skip pattern is invalid
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Result<Self, CrawlError> {
        Ok(Self {
            settings: Arc::new(RunSettings::from_config(config)?),
            fetcher,
            extractor,
            started: AtomicBool::new(false),
        })
    }

    /// Creates a crawler using [`HttpFetcher`] and [`DefaultExtractor`]
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(
            &config.user_agent,
            Duration::from_secs(config.spider.request_timeout_secs),
        )?;
        let extractor = DefaultExtractor::new(
            config.spider.parse_robots_txt,
            config.spider.parse_sitemap_xml,
        );

        Self::new(config, Arc::new(fetcher), Arc::new(extractor))
    }

    /// Seeds the frontier and starts the worker pool
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlHandle)` - The run is RUNNING
    /// * `Err(CrawlError::NoSeeds)` - No seed canonicalized to a crawlable URL
    /// * `Err(CrawlError::AlreadyStarted)` - This crawler was started before
    pub async fn start(&self) -> Result<CrawlHandle, CrawlError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CrawlError::AlreadyStarted);
        }

        let control = Arc::new(RunControl::new());
        let frontier = Arc::new(Frontier::new());
        let visited = Arc::new(VisitedSet::new());
        let (task_tx, task_rx) = mpsc::unbounded_channel();

        let mut seeded = 0;
        for task in self.settings.seed_tasks() {
            if !visited.insert(&task.url) {
                continue;
            }
            control.record(Event::Discovered);
            // The receiver is ours until the handle is returned
            let _ = task_tx.send(task.clone());
            frontier.push(task).await;
            seeded += 1;
        }

        if seeded == 0 {
            return Err(CrawlError::NoSeeds);
        }

        tracing::info!(
            "Starting crawl: {} seed task(s), {} worker(s), max depth {}",
            seeded,
            self.settings.worker_count,
            self.settings.max_depth
        );

        let mut workers = JoinSet::new();
        for id in 0..self.settings.worker_count {
            let worker = Worker {
                id,
                settings: Arc::clone(&self.settings),
                fetcher: Arc::clone(&self.fetcher),
                extractor: Arc::clone(&self.extractor),
                control: Arc::clone(&control),
                frontier: Arc::clone(&frontier),
                visited: Arc::clone(&visited),
                tasks: task_tx.clone(),
            };
            workers.spawn(worker.run());
        }
        drop(task_tx);

        let timer = self.settings.max_duration.map(|limit| {
            let control = Arc::clone(&control);
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                if control.stop() {
                    tracing::info!("Maximum crawl duration of {:?} reached, stopping", limit);
                }
            })
        });

        let supervisor = tokio::spawn(supervise(workers, Arc::clone(&control), timer));

        Ok(CrawlHandle {
            controller: CrawlController::new(control, frontier),
            tasks: task_rx,
            supervisor,
        })
    }
}

/// Joins every worker, then marks the run STOPPED
async fn supervise(
    mut workers: JoinSet<()>,
    control: Arc<RunControl>,
    timer: Option<JoinHandle<()>>,
) -> Result<(), CrawlError> {
    let mut failure = None;

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Worker task failed: {}", e);
            // Survivors may be waiting on the failed worker's in-flight task
            control.stop();
            if failure.is_none() {
                failure = Some(e);
            }
        }
    }

    if let Some(timer) = timer {
        timer.abort();
    }
    control.stop();

    let status = control.snapshot(0);
    tracing::info!(
        "Crawl finished: {} fetched, {} filtered, {} errors, {} discovered",
        status.fetched,
        status.filtered,
        status.errors,
        status.discovered
    );

    match failure {
        Some(e) => Err(CrawlError::Worker(e)),
        None => Ok(()),
    }
}

/// Handle to a running crawl
///
/// Accepted tasks stream through [`CrawlHandle::next_task`]; the stream ends
/// once every worker has exited.
#[derive(Debug)]
pub struct CrawlHandle {
    controller: CrawlController,
    tasks: mpsc::UnboundedReceiver<CrawlTask>,
    supervisor: JoinHandle<Result<(), CrawlError>>,
}

impl CrawlHandle {
    /// Returns a cloneable controller for pause/resume/stop/status
    pub fn controller(&self) -> CrawlController {
        self.controller.clone()
    }

    /// Receives the next accepted task, or `None` once the run is over
    pub async fn next_task(&mut self) -> Option<CrawlTask> {
        self.tasks.recv().await
    }

    /// Waits for every worker to exit and returns the final status
    pub async fn wait(self) -> Result<CrawlStatus, CrawlError> {
        let CrawlHandle {
            controller,
            tasks,
            supervisor,
        } = self;
        drop(tasks);

        supervisor.await??;
        Ok(controller.status())
    }
}

/// One member of the worker pool
struct Worker {
    id: usize,
    settings: Arc<RunSettings>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    control: Arc<RunControl>,
    frontier: Arc<Frontier>,
    visited: Arc<VisitedSet>,
    tasks: mpsc::UnboundedSender<CrawlTask>,
}

impl Worker {
    async fn run(self) {
        tracing::debug!("Worker {} started", self.id);
        let mut state = self.control.subscribe();

        while let Some(task) = self.frontier.pop(&mut state).await {
            self.process(&task).await;
            self.frontier.complete().await;
        }

        tracing::debug!("Worker {} exiting", self.id);
    }

    /// Fetch, filter, extract and offer every discovered link
    async fn process(&self, task: &CrawlTask) {
        tracing::debug!("Worker {} fetching {} (depth {})", self.id, task.target, task.depth);

        let resource = match self.fetcher.fetch(&task.target).await {
            Ok(resource) => {
                self.control.record(Event::Fetched);
                resource
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.control.record(Event::Error);
                return;
            }
        };

        if let ParseDecision::Skip(reason) = self.settings.parse_filter.evaluate(Some(&resource)) {
            tracing::debug!("Not parsing {}: {:?}", task.target, reason);
            self.control.record(Event::Filtered);
            return;
        }

        for link in self.extractor.extract(&resource) {
            if self.control.state() == RunState::Stopped {
                break;
            }
            self.offer(task, &link).await;
        }
    }

    /// Turns a raw reference found on `parent` into a new task, if it qualifies
    async fn offer(&self, parent: &CrawlTask, raw: &str) {
        let resolved = resolve(&parent.target, raw);
        let Some(url) = canonicalize_with(&resolved, None, &self.settings.canonical) else {
            tracing::trace!("Dropping non-crawlable reference {:?}", raw);
            return;
        };

        match self.settings.fetch_filter.check(&url) {
            FetchStatus::Valid => {}
            FetchStatus::OutOfScope => {
                tracing::trace!("Out of scope: {}", url);
                self.control.record(Event::OutOfScope);
                return;
            }
            FetchStatus::Excluded => {
                tracing::debug!("Excluded by skip pattern: {}", url);
                self.control.record(Event::Excluded);
                return;
            }
        }

        if self.settings.exceeds_max_depth(parent.depth + 1) {
            tracing::trace!("Beyond max depth: {}", url);
            self.control.record(Event::DepthLimited);
            return;
        }

        if !self.visited.insert(&url) {
            return;
        }

        let task = parent.child(url, strip_fragment(&resolved).to_string());
        tracing::debug!("Discovered {} (depth {})", task.url, task.depth);
        self.control.record(Event::Discovered);

        // The consumer may have stopped listening; the crawl carries on
        let _ = self.tasks.send(task.clone());
        self.frontier.push(task).await;
    }
}
