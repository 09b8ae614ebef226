//! sitemap.xml link extraction

use super::LinkExtractor;
use crate::resource::Resource;
use scraper::{Html, Selector};

/// Extracts `<loc>` URLs from sitemaps and sitemap indexes
#[derive(Debug, Clone, Copy, Default)]
pub struct SitemapXmlExtractor;

impl SitemapXmlExtractor {
    /// Returns true for `.xml` resources that look like a sitemap
    pub fn handles(resource: &Resource) -> bool {
        let Some(response) = &resource.response else {
            return false;
        };
        if !resource.path().to_ascii_lowercase().ends_with(".xml") {
            return false;
        }

        let body = response.body_text();
        body.contains("<urlset") || body.contains("<sitemapindex")
    }

    /// Extracts the text of every `<loc>` element, in document order
    pub fn extract_from_xml(xml: &str) -> Vec<String> {
        // The HTML parser is lenient enough for the flat structure of sitemaps
        let document = Html::parse_fragment(xml);
        let Ok(selector) = Selector::parse("loc") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|loc| !loc.is_empty())
            .collect()
    }
}

impl LinkExtractor for SitemapXmlExtractor {
    fn extract(&self, resource: &Resource) -> Vec<String> {
        match &resource.response {
            Some(response) => Self::extract_from_xml(&response.body_text()),
            None => Vec::new(),
        }
    }
}
