//! Output module for end-of-run reporting
//!
//! This module renders the final [`CrawlStatus`](crate::CrawlStatus) of a run
//! for the command line.

pub mod stats;

pub use stats::{format_statistics, print_statistics};
