//! Configuration module for crawl runs
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use crawlscope::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawlscope.toml")).unwrap();
//! println!("Crawler will use {} workers", config.spider.worker_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ScopeConfig, SpiderConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
