//! Link extraction
//!
//! A [`LinkExtractor`] turns a fetched resource into the raw reference strings it
//! contains, in document order. References are returned as written (relative or
//! absolute); resolution, canonicalization and scope checks happen in the
//! crawler.

mod html;
mod robots;
mod sitemap;
mod vcs;

pub use html::HtmlExtractor;
pub use robots::RobotsTxtExtractor;
pub use sitemap::SitemapXmlExtractor;
pub use vcs::VcsMetadataExtractor;

use crate::resource::Resource;

/// Extracts candidate links from a fetched resource
pub trait LinkExtractor: Send + Sync {
    /// Returns the raw references found in `resource`, in discovery order
    fn extract(&self, resource: &Resource) -> Vec<String>;
}

/// Extracts the `Location` header of redirect responses
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectExtractor;

impl LinkExtractor for RedirectExtractor {
    fn extract(&self, resource: &Resource) -> Vec<String> {
        resource
            .response
            .as_ref()
            .filter(|response| response.is_redirect())
            .and_then(|response| response.header("location"))
            .map(|location| vec![location.trim().to_string()])
            .unwrap_or_default()
    }
}

/// The default extractor set, dispatched on path and Content-Type
///
/// | Resource | Extractor |
/// |----------|-----------|
/// | any 3xx | `Location` header |
/// | `.git/index`, `.svn/entries`, `.svn/wc.db` | [`VcsMetadataExtractor`] |
/// | `/robots.txt` | [`RobotsTxtExtractor`] (when enabled) |
/// | `*.xml` sitemap | [`SitemapXmlExtractor`] (when enabled) |
/// | HTML or undeclared | [`HtmlExtractor`] |
#[derive(Debug, Clone)]
pub struct DefaultExtractor {
    parse_robots_txt: bool,
    parse_sitemap_xml: bool,
}

impl Default for DefaultExtractor {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl DefaultExtractor {
    pub fn new(parse_robots_txt: bool, parse_sitemap_xml: bool) -> Self {
        Self {
            parse_robots_txt,
            parse_sitemap_xml,
        }
    }
}

impl LinkExtractor for DefaultExtractor {
    fn extract(&self, resource: &Resource) -> Vec<String> {
        let mut links = RedirectExtractor.extract(resource);

        let path = resource.path();
        if VcsMetadataExtractor::handles(path) {
            links.extend(VcsMetadataExtractor.extract(resource));
        } else if self.parse_robots_txt && RobotsTxtExtractor::handles(path) {
            links.extend(RobotsTxtExtractor.extract(resource));
        } else if self.parse_sitemap_xml && SitemapXmlExtractor::handles(resource) {
            links.extend(SitemapXmlExtractor.extract(resource));
        } else if HtmlExtractor::handles(resource) {
            links.extend(HtmlExtractor.extract(resource));
        }

        links
    }
}
