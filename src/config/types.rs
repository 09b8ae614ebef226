use crate::filter::DEFAULT_MAX_PARSE_SIZE_BYTES;
use crate::url::{CanonicalOptions, ParameterHandlingMode};
use crate::ConfigError;
use regex::Regex;
use serde::Deserialize;

/// Main configuration structure for a crawl run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spider: SpiderConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub scope: ScopeConfig,
}

impl Config {
    /// Canonicalization options derived from the spider settings
    pub fn canonical_options(&self) -> CanonicalOptions {
        CanonicalOptions::for_run(
            self.spider.parameter_handling,
            self.spider.handle_odata_parameters,
        )
    }

    /// Compiles the skip-url patterns
    pub fn compile_skip_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.scope
            .skip_urls
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// Spider behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    /// Maximum depth to crawl from the seeds (0 = unlimited)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of concurrent workers
    #[serde(rename = "worker-count")]
    pub worker_count: u32,

    /// How query parameters take part in URL identity
    #[serde(rename = "parameter-handling")]
    pub parameter_handling: ParameterHandlingMode,

    /// Apply the parameter mode to OData identifier segments too
    #[serde(rename = "handle-odata-parameters")]
    pub handle_odata_parameters: bool,

    /// Largest response body mined for links
    #[serde(rename = "max-parse-size-bytes")]
    pub max_parse_size_bytes: u64,

    /// Stop the run after this many seconds (0 = unlimited)
    #[serde(rename = "max-duration-secs")]
    pub max_duration_secs: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Seed `/robots.txt` and mine it for paths
    #[serde(rename = "parse-robots-txt")]
    pub parse_robots_txt: bool,

    /// Seed `/sitemap.xml` and mine sitemaps for locations
    #[serde(rename = "parse-sitemap-xml")]
    pub parse_sitemap_xml: bool,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            worker_count: 2,
            parameter_handling: ParameterHandlingMode::UseAll,
            handle_odata_parameters: false,
            max_parse_size_bytes: DEFAULT_MAX_PARSE_SIZE_BYTES,
            max_duration_secs: 0,
            request_timeout_secs: 30,
            parse_robots_txt: true,
            parse_sitemap_xml: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// What the crawl may touch
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Seed URLs; each also defines a scope prefix
    pub seeds: Vec<String>,

    /// Domain patterns (e.g., "example.com" or "*.example.com") always in scope
    #[serde(rename = "always-in-scope", default)]
    pub always_in_scope: Vec<String>,

    /// Regexes of URLs never to fetch
    #[serde(rename = "skip-urls", default)]
    pub skip_urls: Vec<String>,
}
