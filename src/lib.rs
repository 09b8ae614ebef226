//! Crawlscope: the spidering engine of a web-security testing toolkit
//!
//! Given one or more seed URLs this crate discovers the reachable URL space of a
//! target site. It canonicalizes and resolves every discovered reference, keeps
//! the crawl inside a scope boundary, and fetches each canonical URL at most once
//! per run using a pool of concurrent workers.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod filter;
pub mod output;
pub mod resource;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("No seed URL is crawlable")]
    NoSeeds,

    #[error("Crawl is already running")]
    AlreadyStarted,

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid skip-url pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Transport failures reported by a [`crawler::Fetcher`]
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlHandle, CrawlStatus, CrawlTask, Crawler, RunState};
pub use filter::{FetchFilter, FetchStatus, ParseFilter};
pub use url::{canonicalize, resolve, CanonicalOptions, ParameterHandlingMode};
