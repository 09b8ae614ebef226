use crate::url::matches_domain_pattern;
use crate::UrlError;
use regex::Regex;
use url::Url;

/// Outcome of checking a candidate URL against the fetch filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    /// Inside the scope, may be fetched
    Valid,
    /// Outside the scope (or not a crawlable URL at all)
    OutOfScope,
    /// Inside or outside the scope, but matched a user skip pattern
    Excluded,
}

/// Normalized (scheme, host, port, path-prefix) derived from one seed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePrefix {
    scheme: String,
    host: String,
    port: u16,
    /// `None` means any path is in scope
    path: Option<String>,
}

impl ScopePrefix {
    /// Builds the prefix for a seed URL
    ///
    /// # Returns
    ///
    /// * `Ok(ScopePrefix)` - The normalized prefix
    /// * `Err(UrlError)` - The seed has no scheme, a non-http(s) scheme, or no host
    pub fn from_seed(seed: &str) -> Result<Self, UrlError> {
        let url = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS seeds are supported, got: {}",
                url.scheme()
            )));
        }

        let host = url.host_str().ok_or(UrlError::MissingDomain)?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| UrlError::Malformed(format!("No port for {}", seed)))?;

        let trimmed = url.path().trim_end_matches('/');
        let path = (!trimmed.is_empty()).then(|| trimmed.to_string());

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port,
            path,
        })
    }

    /// Returns true if the URL shares scheme, host and port and sits under the path
    ///
    /// The path match is segment-aligned: `/path` covers `/path` and `/path/x`
    /// but not `/pathology`.
    pub fn contains(&self, candidate: &Url) -> bool {
        if candidate.scheme() != self.scheme
            || candidate.host_str() != Some(self.host.as_str())
            || candidate.port_or_known_default() != Some(self.port)
        {
            return false;
        }

        match &self.path {
            None => true,
            Some(prefix) => candidate
                .path()
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

/// Scope boundary for a crawl run
///
/// A candidate is [`FetchStatus::Valid`] when it falls under any seed's
/// [`ScopePrefix`] or its host matches an always-in-scope domain pattern, and
/// no skip pattern matches it. Anything that fails to parse, or lacks an http(s)
/// scheme or a host, is [`FetchStatus::OutOfScope`].
#[derive(Debug, Clone)]
pub struct FetchFilter {
    prefixes: Vec<ScopePrefix>,
    always_in_scope: Vec<String>,
    skip_patterns: Vec<Regex>,
}

impl FetchFilter {
    /// Creates a filter scoped to a single seed URL
    ///
    /// # Example
    ///
    /// ```
    /// use crawlscope::filter::{FetchFilter, FetchStatus};
    ///
    /// let filter = FetchFilter::new("http://example.org/path").unwrap();
    /// assert_eq!(filter.check("http://example.org/path/subtree"), FetchStatus::Valid);
    /// assert_eq!(filter.check("http://example.org/pathology"), FetchStatus::OutOfScope);
    /// ```
    pub fn new(seed: &str) -> Result<Self, UrlError> {
        Self::from_seeds([seed])
    }

    /// Creates a filter whose scope is the union of every seed's prefix
    pub fn from_seeds<'a>(seeds: impl IntoIterator<Item = &'a str>) -> Result<Self, UrlError> {
        let prefixes = seeds
            .into_iter()
            .map(ScopePrefix::from_seed)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            prefixes,
            always_in_scope: Vec::new(),
            skip_patterns: Vec::new(),
        })
    }

    /// Adds wildcard domain patterns whose hosts are always in scope
    pub fn with_always_in_scope(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.always_in_scope.extend(patterns);
        self
    }

    /// Adds URL patterns that exclude a candidate regardless of scope
    pub fn with_skip_patterns(mut self, patterns: impl IntoIterator<Item = Regex>) -> Self {
        self.skip_patterns.extend(patterns);
        self
    }

    /// Returns the seed prefixes
    pub fn prefixes(&self) -> &[ScopePrefix] {
        &self.prefixes
    }

    /// Checks a candidate URL
    ///
    /// Skip patterns see `candidate` exactly as given, not the url crate's
    /// re-serialization of it.
    pub fn check(&self, candidate: &str) -> FetchStatus {
        let Ok(url) = Url::parse(candidate) else {
            return FetchStatus::OutOfScope;
        };
        self.classify(candidate, &url)
    }

    /// Checks an already parsed candidate URL
    pub fn check_url(&self, url: &Url) -> FetchStatus {
        self.classify(url.as_str(), url)
    }

    fn classify(&self, candidate: &str, url: &Url) -> FetchStatus {
        if url.scheme() != "http" && url.scheme() != "https" {
            return FetchStatus::OutOfScope;
        }
        let Some(host) = url.host_str() else {
            return FetchStatus::OutOfScope;
        };

        if self
            .skip_patterns
            .iter()
            .any(|pattern| pattern.is_match(candidate))
        {
            return FetchStatus::Excluded;
        }

        if self.prefixes.iter().any(|prefix| prefix.contains(url))
            || self
                .always_in_scope
                .iter()
                .any(|pattern| matches_domain_pattern(pattern, host))
        {
            FetchStatus::Valid
        } else {
            FetchStatus::OutOfScope
        }
    }
}
