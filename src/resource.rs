//! Value-type description of a fetched resource
//!
//! A [`Resource`] is what a fetcher hands back and what the parse filter and
//! link extractors look at. Request and response halves are optional so that
//! incomplete exchanges can be represented (and filtered out).

use std::borrow::Cow;

/// A fetched resource: the URL plus whatever request/response metadata exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The URL that was requested
    pub url: String,

    /// Request metadata, absent if no request was made
    pub request: Option<RequestMeta>,

    /// Response metadata and body, absent if nothing came back
    pub response: Option<ResponseMeta>,
}

/// Request half of an exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    /// HTTP method
    pub method: String,

    /// Path component of the requested URL
    pub path: String,
}

/// Response half of an exchange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,

    /// Response headers in arrival order
    pub headers: Vec<(String, String)>,

    /// Content-Length as declared by the server
    pub declared_length: Option<u64>,

    /// Response body
    pub body: Vec<u8>,
}

impl Resource {
    /// Creates a resource for a GET of `url` with the given response
    pub fn get(url: impl Into<String>, response: ResponseMeta) -> Self {
        let url = url.into();
        let path = request_path(&url);
        Self {
            url,
            request: Some(RequestMeta {
                method: "GET".to_string(),
                path,
            }),
            response: Some(response),
        }
    }

    /// Returns the request path, or an empty string without a request
    pub fn path(&self) -> &str {
        self.request.as_ref().map_or("", |r| r.path.as_str())
    }

    /// Returns the response Content-Type, if any
    pub fn content_type(&self) -> Option<&str> {
        self.response.as_ref().and_then(ResponseMeta::content_type)
    }
}

impl ResponseMeta {
    /// Creates a response with a status, a Content-Type and a body
    pub fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            declared_length: None,
            body: body.into(),
        }
    }

    /// Adds a header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Looks up a header case-insensitively (first occurrence wins)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the Content-Type header value
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns true for 3xx responses
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Size of the body: the larger of the declared and the observed length
    pub fn body_size(&self) -> u64 {
        let observed = self.body.len() as u64;
        self.declared_length.map_or(observed, |declared| declared.max(observed))
    }

    /// Body decoded as UTF-8, lossily
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Extracts the path of a URL string without decoding it
fn request_path(url: &str) -> String {
    let uri = crate::url::RawUri::split(url);
    if uri.path.is_empty() {
        "/".to_string()
    } else {
        uri.path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_records_request_path() {
        let resource = Resource::get(
            "http://example.com/a/b?x=1",
            ResponseMeta::new(200, "text/html", ""),
        );
        assert_eq!(resource.path(), "/a/b");

        let root = Resource::get("http://example.com", ResponseMeta::default());
        assert_eq!(root.path(), "/");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = ResponseMeta::new(301, "text/html", "").with_header("Location", "/next");
        assert_eq!(response.header("location"), Some("/next"));
        assert_eq!(response.content_type(), Some("text/html"));
        assert!(response.is_redirect());
    }

    #[test]
    fn test_body_size_prefers_larger_length() {
        let mut response = ResponseMeta::new(200, "text/html", "abc");
        assert_eq!(response.body_size(), 3);

        response.declared_length = Some(10);
        assert_eq!(response.body_size(), 10);

        response.declared_length = Some(1);
        assert_eq!(response.body_size(), 3);
    }
}
