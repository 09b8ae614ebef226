/// Checks if a host matches an always-in-scope domain pattern
///
/// Two kinds of pattern are supported:
/// 1. Exact: `example.com` matches only `example.com`
/// 2. Wildcard: `*.example.com` matches `example.com` itself and any subdomain
///    at any depth (`api.v2.example.com`)
///
/// Comparison ignores ASCII case, since hosts are case-insensitive.
///
/// # Examples
///
/// ```
/// use crawlscope::url::matches_domain_pattern;
///
/// assert!(matches_domain_pattern("*.example.com", "Static.Example.com"));
/// assert!(matches_domain_pattern("*.example.com", "example.com"));
/// assert!(!matches_domain_pattern("*.example.com", "badexample.com"));
/// ```
pub fn matches_domain_pattern(pattern: &str, host: &str) -> bool {
    let Some(base) = pattern.strip_prefix("*.") else {
        return host.eq_ignore_ascii_case(pattern);
    };

    if host.eq_ignore_ascii_case(base) {
        return true;
    }

    // host must end with ".<base>" on a label boundary
    host.len() > base.len()
        && host.is_char_boundary(host.len() - base.len())
        && host[host.len() - base.len()..].eq_ignore_ascii_case(base)
        && host.as_bytes()[host.len() - base.len() - 1] == b'.'
}
