//! robots.txt link extraction
//!
//! The paths a site lists under `Allow`/`Disallow` are often the interesting
//! ones, so they are treated as links. `Sitemap` entries are returned too.

use super::LinkExtractor;
use crate::resource::Resource;

/// Extracts paths and sitemap URLs from robots.txt files
#[derive(Debug, Clone, Copy, Default)]
pub struct RobotsTxtExtractor;

impl RobotsTxtExtractor {
    /// Returns true if the request path is a robots.txt file
    pub fn handles(path: &str) -> bool {
        path.eq_ignore_ascii_case("/robots.txt")
    }

    /// Extracts references from robots.txt content
    ///
    /// Wildcard rules are cut at the first `*` and a trailing `$` anchor is
    /// dropped; rules that become empty (or just `/`) are skipped.
    pub fn extract_from_text(content: &str) -> Vec<String> {
        let mut links = Vec::new();

        for line in content.lines() {
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            };

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "allow" | "disallow" => {
                    let path = match value.find('*') {
                        Some(idx) => &value[..idx],
                        None => value,
                    };
                    let path = path.strip_suffix('$').unwrap_or(path);
                    if !path.is_empty() && path != "/" {
                        links.push(path.to_string());
                    }
                }
                "sitemap" if !value.is_empty() => links.push(value.to_string()),
                _ => {}
            }
        }

        links
    }
}

impl LinkExtractor for RobotsTxtExtractor {
    fn extract(&self, resource: &Resource) -> Vec<String> {
        match &resource.response {
            Some(response) if (200..300).contains(&response.status) => {
                Self::extract_from_text(&response.body_text())
            }
            _ => Vec::new(),
        }
    }
}
