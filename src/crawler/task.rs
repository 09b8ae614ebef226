use std::fmt;

/// A unit of crawl work
///
/// Tasks are created when a link passes the fetch filter and is seen for the
/// first time in a run, consumed by exactly one worker, and never re-queued.
///
/// `url` is the canonical identity used for de-duplication. It can drop query
/// values or OData keys, so the request goes to `target` instead: the resolved
/// reference with its fragment removed and everything else as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTask {
    /// Canonical URL identifying this task within the run
    pub url: String,

    /// URL actually requested, and the base for links found on the page
    pub target: String,

    /// Distance from the seeds (seeds are depth 0)
    pub depth: u32,

    /// Canonical URL of the page the link was found on (`None` for seeds)
    pub parent: Option<String>,
}

impl CrawlTask {
    /// Creates a depth-0 task for a seed
    pub fn seed(url: String, target: String) -> Self {
        Self {
            url,
            target,
            depth: 0,
            parent: None,
        }
    }

    /// Creates a task for a link discovered on this task's page
    pub fn child(&self, url: String, target: String) -> Self {
        Self {
            url,
            target,
            depth: self.depth + 1,
            parent: Some(self.url.clone()),
        }
    }
}

impl fmt::Display for CrawlTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            self.depth,
            self.url,
            self.parent.as_deref().unwrap_or("-")
        )
    }
}
