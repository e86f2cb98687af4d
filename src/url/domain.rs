use super::normalize::parse_lenient;

/// Extracts the scope domain of a URL
///
/// The scope domain is the lowercase host with a single leading `www.` removed. It
/// decides whether a link stays inside the site being crawled. Any URL without a
/// resolvable host yields an empty string, which never matches a real domain.
///
/// # Examples
///
/// ```
/// use sumi_gleaner::url::scope_domain;
///
/// assert_eq!(scope_domain("https://www.example.com/path"), "example.com");
/// assert_eq!(scope_domain("https://blog.example.com/"), "blog.example.com");
/// assert_eq!(scope_domain("::not a url::"), "");
/// ```
pub fn scope_domain(url_str: &str) -> String {
    let Some(url) = parse_lenient(url_str) else {
        return String::new();
    };

    match url.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            match host.strip_prefix("www.") {
                Some(rest) => rest.to_string(),
                None => host,
            }
        }
        None => String::new(),
    }
}

/// Returns true if `url_str` belongs to the site identified by `seed_domain`
///
/// An empty seed domain matches nothing.
pub fn in_scope(seed_domain: &str, url_str: &str) -> bool {
    !seed_domain.is_empty() && scope_domain(url_str) == seed_domain
}
