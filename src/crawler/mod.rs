//! Crawler module for concurrent discovery of a target's URL space
//!
//! This module contains the core crawling logic, including:
//! - Crawl tasks, the frontier queue and the visited-set
//! - Run state with pause/resume/stop and status counters
//! - The fetcher seam and its HTTP implementation
//! - The worker pool tying fetching, filtering and link extraction together

mod control;
mod fetcher;
mod frontier;
mod scheduler;
mod task;

pub use control::{CrawlController, CrawlStatus, RunState};
pub use fetcher::{build_http_client, user_agent, Fetcher, HttpFetcher};
pub use frontier::{Frontier, VisitedSet};
pub use scheduler::{CrawlHandle, Crawler};
pub use task::CrawlTask;

use crate::config::Config;
use crate::CrawlError;

/// Runs a complete crawl with the default HTTP fetcher and extractors
///
/// Accepted tasks are logged at `info` as they are discovered. Use
/// [`Crawler::start`] directly to consume them or to control the run.
///
/// # Returns
///
/// * `Ok(CrawlStatus)` - Final counters once every worker has exited
/// * `Err(CrawlError)` - The run could not be configured or started
pub async fn crawl(config: &Config) -> Result<CrawlStatus, CrawlError> {
    let crawler = Crawler::from_config(config)?;
    let mut handle = crawler.start().await?;

    while let Some(task) = handle.next_task().await {
        tracing::info!("Accepted {}", task);
    }

    handle.wait().await
}
