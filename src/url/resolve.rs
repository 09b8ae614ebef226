use super::split_scheme;

/// Resolves a reference found in markup against the URL of the page it came from
///
/// # Resolution Rules
///
/// | Reference | Result |
/// |-----------|--------|
/// | empty | `base`, unchanged (query and fragment included) |
/// | has a scheme | the reference itself |
/// | `//host/...` | base scheme + reference |
/// | `#f`, `?q`, `;p` | base path with its query, fragment and parameters replaced |
/// | `/path` | base origin + reference |
/// | anything else | reference joined onto the base path's directory |
///
/// Afterwards `.` segments are removed and `..` removes the preceding segment;
/// a `..` with nothing to remove is dropped, so the result never climbs above
/// the root.
///
/// # Examples
///
/// ```
/// use crawlscope::url::resolve;
///
/// assert_eq!(resolve("http://www.abc.de/w/x", "y/z"), "http://www.abc.de/w/y/z");
/// assert_eq!(resolve("http://abc.de/123/xyz", "../test"), "http://abc.de/test");
/// assert_eq!(resolve("http://abc.de/a?q=1#f", ""), "http://abc.de/a?q=1#f");
/// ```
pub fn resolve(base: &str, relative: &str) -> String {
    let relative = relative.trim();
    if relative.is_empty() {
        return base.to_string();
    }

    if split_scheme(relative).is_some() {
        return relative.to_string();
    }

    let base = base.trim();

    if relative.starts_with("//") {
        return match split_scheme(base) {
            Some((scheme, _)) => format!("{}:{}", scheme, relative),
            None => relative.to_string(),
        };
    }

    let (origin, base_path) = split_origin(base);

    if relative.starts_with(['#', '?', ';']) {
        let path = if base_path.is_empty() && !origin.is_empty() {
            "/"
        } else {
            base_path
        };
        return format!("{}{}{}", origin, path, relative);
    }

    let suffix_start = relative.find(['?', '#']).unwrap_or(relative.len());
    let (relative_path, suffix) = relative.split_at(suffix_start);

    let joined = if relative_path.starts_with('/') {
        relative_path.to_string()
    } else {
        let directory = match base_path.rfind('/') {
            Some(idx) => &base_path[..=idx],
            None if origin.is_empty() => "",
            None => "/",
        };
        format!("{}{}", directory, relative_path)
    };

    format!("{}{}{}", origin, remove_dot_segments(&joined), suffix)
}

/// Returns `url` without its fragment, leaving the rest untouched
///
/// ```
/// use crawlscope::url::strip_fragment;
///
/// assert_eq!(strip_fragment("http://abc.de/a?q=1#top"), "http://abc.de/a?q=1");
/// ```
pub fn strip_fragment(url: &str) -> &str {
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Splits a base URL into `scheme://authority` and its path
///
/// Query, fragment and `;` parameters are dropped from the path.
fn split_origin(base: &str) -> (&str, &str) {
    let end = base.find(['?', '#']).unwrap_or(base.len());
    let base = &base[..end];

    let origin_len = match split_scheme(base) {
        Some((scheme, rest)) => match rest.strip_prefix("//") {
            Some(after) => scheme.len() + 3 + after.find('/').unwrap_or(after.len()),
            None => scheme.len() + 1,
        },
        None => 0,
    };

    let (origin, path) = base.split_at(origin_len);
    let path = match path.find(';') {
        Some(idx) => &path[..idx],
        None => path,
    };

    (origin, path)
}

/// Removes `.` and `..` segments left to right
fn remove_dot_segments(path: &str) -> String {
    let (rooted, body) = match path.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, path),
    };

    let mut output: Vec<&str> = Vec::new();
    let mut ends_as_directory = false;

    for segment in body.split('/') {
        ends_as_directory = false;
        match segment {
            "." => ends_as_directory = true,
            ".." => {
                output.pop();
                ends_as_directory = true;
            }
            _ => output.push(segment),
        }
    }

    if ends_as_directory {
        output.push("");
    }

    let mut result = String::with_capacity(path.len());
    if rooted {
        result.push('/');
    }
    result.push_str(&output.join("/"));
    result
}
