//! HTML link extraction
//!
//! This module pulls every fetchable reference out of an HTML document:
//! anchors, image maps, `<link>` elements, frames, scripts, images, form
//! actions and `<meta http-equiv="refresh">` targets.

use super::LinkExtractor;
use crate::resource::Resource;
use crate::url::resolve;
use scraper::{ElementRef, Html, Selector};

/// Elements that can carry a reference
const LINK_SOURCES: &str = "a[href], area[href], link[href], frame[src], iframe[src], \
    script[src], img[src], form[action], meta[http-equiv][content]";

/// Extracts references from HTML documents
///
/// # Extraction Rules
///
/// - References are returned in document order, trimmed, empty ones dropped
/// - `<base href>` (resolved against the page URL) rebases every reference
/// - `javascript:`/`mailto:` and friends are returned as-is; the canonicalizer
///   rejects them later
/// - `rel="nofollow"` is ignored, such links are followed too
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// Returns true for HTML resources, or ones that declare no Content-Type
    pub fn handles(resource: &Resource) -> bool {
        match resource.content_type() {
            Some(content_type) => content_type.to_ascii_lowercase().contains("html"),
            None => resource.response.is_some(),
        }
    }

    /// Extracts references from an HTML string
    ///
    /// # Example
    ///
    /// ```
    /// use crawlscope::extract::HtmlExtractor;
    ///
    /// let html = r#"<html><body><a href="/page">Link</a><img src="logo.png"></body></html>"#;
    /// let links = HtmlExtractor::extract_from_html(html, "https://example.com/");
    /// assert_eq!(links, vec!["/page", "logo.png"]);
    /// ```
    pub fn extract_from_html(html: &str, page_url: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let base = base_href(&document).map(|href| resolve(page_url, &href));

        let Ok(selector) = Selector::parse(LINK_SOURCES) else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(reference_of)
            .map(|reference| match &base {
                Some(base) => resolve(base, &reference),
                None => reference,
            })
            .collect()
    }
}

impl LinkExtractor for HtmlExtractor {
    fn extract(&self, resource: &Resource) -> Vec<String> {
        match &resource.response {
            Some(response) => Self::extract_from_html(&response.body_text(), &resource.url),
            None => Vec::new(),
        }
    }
}

/// Returns the first `<base href>` of the document
fn base_href(document: &Html) -> Option<String> {
    let selector = Selector::parse("base[href]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Returns the reference carried by an element matched by [`LINK_SOURCES`]
fn reference_of(element: ElementRef<'_>) -> Option<String> {
    let value = element.value();
    let raw = match value.name() {
        "a" | "area" | "link" => value.attr("href"),
        "frame" | "iframe" | "script" | "img" => value.attr("src"),
        "form" => value.attr("action"),
        "meta" => {
            let http_equiv = value.attr("http-equiv")?;
            if !http_equiv.eq_ignore_ascii_case("refresh") {
                return None;
            }
            return value.attr("content").and_then(refresh_target);
        }
        _ => None,
    }?;

    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parses the target of a refresh directive such as `5; URL='/next'`
fn refresh_target(content: &str) -> Option<String> {
    let (_, rest) = content.split_once(';')?;
    let rest = rest.trim();
    let (key, target) = rest.split_once('=')?;
    if !key.trim().eq_ignore_ascii_case("url") {
        return None;
    }

    let target = target.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    (!target.is_empty()).then(|| target.to_string())
}
