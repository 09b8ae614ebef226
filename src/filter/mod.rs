//! Fetch and parse filters
//!
//! The fetch filter decides whether a discovered URL may be fetched at all (the
//! scope boundary); the parse filter decides whether a fetched resource should be
//! mined for further links. Both are pure and read-only for the life of a run.

mod fetch;
mod parse;

pub use fetch::{FetchFilter, FetchStatus, ScopePrefix};
pub use parse::{ParseDecision, ParseFilter, SkipReason, DEFAULT_MAX_PARSE_SIZE_BYTES};
