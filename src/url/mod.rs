//! URL handling module
//!
//! This module provides canonicalization (the crawl identity of a URI),
//! resolution of references found in markup against a base URL, and wildcard
//! domain matching for scope configuration.

mod canonical;
mod matcher;
mod parse;
mod resolve;

use serde::Deserialize;

pub use canonical::{canonicalize, canonicalize_with};
pub use matcher::matches_domain_pattern;
pub use resolve::{resolve, strip_fragment};

pub(crate) use parse::{split_scheme, Authority, RawUri};

/// How query parameters (and OData identifier arguments) take part in a URL's identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterHandlingMode {
    /// Keep every parameter with its value
    #[default]
    UseAll,
    /// Keep parameter names only, de-duplicated
    IgnoreValue,
    /// Drop the parameters entirely
    IgnoreCompletely,
}

impl ParameterHandlingMode {
    /// Returns the configuration spelling of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UseAll => "use-all",
            Self::IgnoreValue => "ignore-value",
            Self::IgnoreCompletely => "ignore-completely",
        }
    }
}

/// Options controlling [`canonicalize_with`]
///
/// `odata` is independent of `query`: when set, every path segment shaped like
/// `name(arglist)` has its argument list canonicalized with that mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalOptions {
    pub query: ParameterHandlingMode,
    pub odata: Option<ParameterHandlingMode>,
}

impl CanonicalOptions {
    /// Options for a crawl run: one mode, optionally applied to OData segments too
    pub fn for_run(mode: ParameterHandlingMode, handle_odata: bool) -> Self {
        Self {
            query: mode,
            odata: handle_odata.then_some(mode),
        }
    }
}

/// Returns the registered default port of a crawlable scheme
///
/// Only `http` and `https` are crawlable; every other scheme yields `None`.
pub fn default_port(scheme: &str) -> Option<u16> {
    if scheme.eq_ignore_ascii_case("http") {
        Some(80)
    } else if scheme.eq_ignore_ascii_case("https") {
        Some(443)
    } else {
        None
    }
}
