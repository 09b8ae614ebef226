use crate::resource::Resource;

/// Default maximum body size mined for links (2.5 MiB)
pub const DEFAULT_MAX_PARSE_SIZE_BYTES: u64 = 2_621_440;

/// Content-Type fragments of resources that can carry links
const TEXTUAL_CONTENT_TYPES: &[&str] = &[
    "text",
    "html",
    "xml",
    "json",
    "javascript",
    "ecmascript",
    "x-www-form-urlencoded",
];

/// Path markers of version-control metadata, parsed whatever their Content-Type
const VCS_METADATA_MARKERS: &[&str] = &["/.svn/", "/.git/"];

/// Why a resource is not mined for links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Missing resource, request or response
    Incomplete,
    /// Body larger than the configured maximum
    MaxSize,
    /// Declared Content-Type cannot carry links
    NotText,
}

/// Outcome of the parse filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseDecision {
    Parse,
    Skip(SkipReason),
}

/// Decides whether a fetched resource should be mined for links
///
/// # Rules (in order)
///
/// 1. No resource, no request, or no response: skip
/// 2. Redirects (3xx): always parse, their `Location` must be followed
/// 3. Body strictly larger than the maximum: skip (exactly at the maximum is fine)
/// 4. Declared non-textual Content-Type: skip, unless the path points into
///    `.svn/` or `.git/` metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseFilter {
    max_parse_size_bytes: u64,
}

impl Default for ParseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARSE_SIZE_BYTES)
    }
}

impl ParseFilter {
    pub fn new(max_parse_size_bytes: u64) -> Self {
        Self {
            max_parse_size_bytes,
        }
    }

    pub fn max_parse_size_bytes(&self) -> u64 {
        self.max_parse_size_bytes
    }

    /// Evaluates a resource, reporting why it is skipped
    pub fn evaluate(&self, resource: Option<&Resource>) -> ParseDecision {
        let Some(resource) = resource else {
            return ParseDecision::Skip(SkipReason::Incomplete);
        };
        let (Some(request), Some(response)) = (&resource.request, &resource.response) else {
            return ParseDecision::Skip(SkipReason::Incomplete);
        };

        if response.is_redirect() {
            return ParseDecision::Parse;
        }

        if response.body_size() > self.max_parse_size_bytes {
            return ParseDecision::Skip(SkipReason::MaxSize);
        }

        match response.content_type() {
            Some(content_type)
                if !is_textual(content_type) && !is_vcs_metadata(&request.path) =>
            {
                ParseDecision::Skip(SkipReason::NotText)
            }
            _ => ParseDecision::Parse,
        }
    }

    /// Returns true if the resource should be mined for links
    pub fn should_parse(&self, resource: Option<&Resource>) -> bool {
        self.evaluate(resource) == ParseDecision::Parse
    }
}

fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    TEXTUAL_CONTENT_TYPES
        .iter()
        .any(|fragment| content_type.contains(fragment))
}

fn is_vcs_metadata(path: &str) -> bool {
    VCS_METADATA_MARKERS.iter().any(|marker| {
        path.contains(marker) || path.starts_with(&marker[1..])
    })
}
