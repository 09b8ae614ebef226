//! Splitting of raw URI references into borrowed components
//!
//! Nothing here decodes or re-encodes: every component is a slice of the input,
//! so percent-encoding survives byte-for-byte.

/// Components of a raw URI reference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RawUri<'a> {
    pub scheme: Option<&'a str>,
    /// Everything between `//` and the path, userinfo and port included
    pub authority: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> RawUri<'a> {
    /// Splits a reference into scheme, authority, path, query and fragment
    pub fn split(input: &'a str) -> Self {
        let (rest, fragment) = match input.find('#') {
            Some(idx) => (&input[..idx], Some(&input[idx + 1..])),
            None => (input, None),
        };

        let (rest, query) = match rest.find('?') {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };

        let (scheme, rest) = match split_scheme(rest) {
            Some((scheme, after)) => (Some(scheme), after),
            None => (None, rest),
        };

        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                (Some(&after[..end]), &after[end..])
            }
            None => (None, rest),
        };

        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }
}

/// Splits `scheme:rest` if the input starts with a syntactically valid scheme
pub(crate) fn split_scheme(input: &str) -> Option<(&str, &str)> {
    let colon = input.find(':')?;
    let candidate = &input[..colon];

    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }

    Some((candidate, &input[colon + 1..]))
}

/// Host and port of an authority, with userinfo discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Authority<'a> {
    pub host: &'a str,
    pub port: Option<u16>,
}

impl<'a> Authority<'a> {
    /// Parses `[userinfo@]host[:port]`
    ///
    /// Returns `None` when the port is not a valid number or an IPv6 literal is
    /// unterminated. An empty port (`host:`) counts as no port.
    pub fn parse(authority: &'a str) -> Option<Self> {
        let host_port = match authority.rfind('@') {
            Some(idx) => &authority[idx + 1..],
            None => authority,
        };

        let (host, port) = if host_port.starts_with('[') {
            let close = host_port.find(']')?;
            let host = &host_port[..=close];
            match &host_port[close + 1..] {
                "" => (host, None),
                rest => (host, Some(rest.strip_prefix(':')?)),
            }
        } else {
            match host_port.rfind(':') {
                Some(idx) => (&host_port[..idx], Some(&host_port[idx + 1..])),
                None => (host_port, None),
            }
        };

        let port = match port {
            None | Some("") => None,
            Some(digits) => Some(digits.parse::<u16>().ok()?),
        };

        Some(Self { host, port })
    }
}
