use super::{default_port, resolve, split_scheme, Authority, CanonicalOptions, RawUri};
use crate::url::ParameterHandlingMode;
use std::borrow::Cow;

/// Canonicalizes a URI with default options (all parameters kept, no OData handling)
///
/// See [`canonicalize_with`].
///
/// # Examples
///
/// ```
/// use crawlscope::url::canonicalize;
///
/// assert_eq!(
///     canonicalize("HTTP://Example.COM:80/a/./b?z=1&a=2#top", None).as_deref(),
///     Some("http://example.com/a/b?a=2&z=1")
/// );
/// assert_eq!(canonicalize("mailto:someone@example.com", None), None);
/// ```
pub fn canonicalize(raw: &str, base: Option<&str>) -> Option<String> {
    canonicalize_with(raw, base, &CanonicalOptions::default())
}

/// Produces the crawl identity of a URI
///
/// # Canonicalization Steps
///
/// 1. A reference without a scheme is first resolved against `base`; without a
///    base it is not canonicalizable
/// 2. Reject anything that is not `http`/`https` or has no host
/// 3. Lowercase scheme and host, drop userinfo and fragment
/// 4. Drop the port when it is the scheme's own default
/// 5. Collapse empty and `.` segments; `..` pops the previous segment, and at
///    the root it is kept literally
/// 6. Apply the OData mode (if any) to `name(args)` segments
/// 7. Apply the query mode, then sort pairs by (name, value)
///
/// Percent-encoded octets are never decoded or re-encoded. The result is a
/// fixed point: canonicalizing it again returns the same string.
///
/// # Returns
///
/// * `Some(String)` - The canonical URL
/// * `None` - The URI is not crawlable (`mailto:`, `javascript:`, no host, bad port)
pub fn canonicalize_with(
    raw: &str,
    base: Option<&str>,
    options: &CanonicalOptions,
) -> Option<String> {
    let raw = raw.trim();

    let resolved;
    let input = if split_scheme(raw).is_some() {
        raw
    } else {
        resolved = resolve(base?, raw);
        resolved.as_str()
    };

    let uri = RawUri::split(input);
    let scheme = uri.scheme?.to_ascii_lowercase();
    let scheme_default = default_port(&scheme)?;

    let authority = Authority::parse(uri.authority?)?;
    if authority.host.is_empty() {
        return None;
    }

    let mut canonical = String::with_capacity(input.len());
    canonical.push_str(&scheme);
    canonical.push_str("://");
    canonical.push_str(&authority.host.to_ascii_lowercase());

    if let Some(port) = authority.port.filter(|port| *port != scheme_default) {
        canonical.push(':');
        canonical.push_str(&port.to_string());
    }

    push_path(&mut canonical, uri.path, options.odata);

    if let Some(query) = uri.query.and_then(|q| canonical_query(q, options.query)) {
        canonical.push('?');
        canonical.push_str(&query);
    }

    Some(canonical)
}

/// Appends the normalized path, which always starts with `/`
fn push_path(out: &mut String, path: &str, odata: Option<ParameterHandlingMode>) {
    let mut segments: Vec<&str> = Vec::new();
    let mut ends_as_directory = false;

    for segment in path.split('/') {
        ends_as_directory = true;
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // Nothing left to climb out of; keep it
                _ => segments.push(".."),
            },
            _ => {
                segments.push(segment);
                ends_as_directory = false;
            }
        }
    }

    if segments.is_empty() {
        out.push('/');
        return;
    }

    for segment in &segments {
        out.push('/');
        match odata {
            Some(mode) => out.push_str(&odata_segment(segment, mode)),
            None => out.push_str(segment),
        }
    }

    if ends_as_directory {
        out.push('/');
    }
}

/// Canonicalizes the argument list of an OData identifier segment like `Book(1)`
fn odata_segment(segment: &str, mode: ParameterHandlingMode) -> Cow<'_, str> {
    let Some(open) = segment.find('(') else {
        return Cow::Borrowed(segment);
    };
    let Some(args) = segment[open + 1..].strip_suffix(')') else {
        return Cow::Borrowed(segment);
    };
    if args.contains(['(', ')']) {
        return Cow::Borrowed(segment);
    }

    let name = &segment[..open];
    match mode {
        ParameterHandlingMode::UseAll => Cow::Borrowed(segment),
        ParameterHandlingMode::IgnoreCompletely => Cow::Owned(format!("{}()", name)),
        ParameterHandlingMode::IgnoreValue => {
            let keys: Vec<&str> = args
                .split(',')
                .filter_map(|arg| {
                    let key = match arg.split_once('=') {
                        Some((key, _)) => key.trim(),
                        // A bare argument is either a key value (`1`, `'abc'`) or an
                        // already stripped key name
                        None => arg.trim(),
                    };
                    is_odata_key_name(key).then_some(key)
                })
                .collect();
            Cow::Owned(format!("{}({})", name, keys.join(",")))
        }
    }
}

/// Key names are identifiers; literals (numbers, quoted strings, booleans, null) are values
fn is_odata_key_name(token: &str) -> bool {
    let mut chars = token.chars();
    let starts_like_name = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    starts_like_name
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !matches!(token, "true" | "false" | "null")
}

/// Canonicalizes a raw query string, or returns `None` when nothing remains
///
/// Pairs are split literally on `&` and the first `=`; encoded separators such as
/// `%26` stay inside their pair.
fn canonical_query(query: &str, mode: ParameterHandlingMode) -> Option<String> {
    let pairs = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (pair, None),
        });

    let rendered = match mode {
        ParameterHandlingMode::IgnoreCompletely => return None,
        ParameterHandlingMode::UseAll => {
            let mut pairs: Vec<(&str, Option<&str>)> = pairs.collect();
            pairs.sort_unstable();
            pairs
                .into_iter()
                .map(|(name, value)| match value {
                    Some(value) => format!("{}={}", name, value),
                    None => name.to_string(),
                })
                .collect::<Vec<_>>()
        }
        ParameterHandlingMode::IgnoreValue => {
            let mut names: Vec<&str> = pairs
                .map(|(name, _)| name)
                .filter(|name| !name.is_empty())
                .collect();
            names.sort_unstable();
            names.dedup();
            names.into_iter().map(str::to_string).collect()
        }
    };

    if rendered.is_empty() {
        None
    } else {
        Some(rendered.join("&"))
    }
}
