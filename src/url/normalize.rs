use url::Url;

/// Schemes whose opaque part may be all digits (`tel:123`) and must not be read as a port
const OPAQUE_SCHEMES: &[&str] = &["tel", "sms", "fax"];

/// Parses a URL string, assuming `https` when no scheme is given
///
/// `Url::parse` rejects scheme-less input such as `example.com/page` as a relative
/// URL, and reads `example.com:8080/page` as scheme `example.com`. Both are retried
/// with an `https://` prefix.
pub(crate) fn parse_lenient(url_str: &str) -> Option<Url> {
    let trimmed = url_str.trim();
    match Url::parse(trimmed) {
        Ok(url) if is_host_with_port(trimmed, &url) => {
            Url::parse(&format!("https://{}", trimmed)).ok().or(Some(url))
        }
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", trimmed)).ok()
        }
        Err(_) => None,
    }
}

/// True for `host:port[/...]` input that the parser took for `scheme:opaque`
fn is_host_with_port(input: &str, parsed: &Url) -> bool {
    if parsed.has_host() || input.contains("://") {
        return false;
    }

    let scheme = parsed.scheme();
    if OPAQUE_SCHEMES.contains(&scheme) {
        return false;
    }

    let Some(rest) = input.get(scheme.len() + 1..) else {
        return false;
    };
    let port_len = rest.chars().take_while(char::is_ascii_digit).count();

    port_len > 0
        && rest[port_len..]
            .chars()
            .next()
            .map_or(true, |c| matches!(c, '/' | '?' | '#'))
}

/// Normalizes a URL into the dedup key used by the visited set
///
/// # Normalization Steps
///
/// 1. Parse the URL, defaulting the scheme to `https` when absent
/// 2. If no host can be resolved, return the input unchanged
/// 3. Rebuild as `scheme://host[:port]/path`, dropping query and fragment
/// 4. Strip trailing slashes (the bare root becomes `scheme://host`)
///
/// The function is total: malformed input comes back unchanged rather than
/// producing an error, and `normalize(normalize(u)) == normalize(u)`.
///
/// # Examples
///
/// ```
/// use sumi_gleaner::url::normalize;
///
/// assert_eq!(normalize("https://example.com/docs/?page=2#intro"), "https://example.com/docs");
/// assert_eq!(normalize("example.com/about"), "https://example.com/about");
/// assert_eq!(normalize("mailto:someone@example.com"), "mailto:someone@example.com");
/// ```
pub fn normalize(url_str: &str) -> String {
    let Some(url) = parse_lenient(url_str) else {
        return url_str.to_string();
    };

    let Some(host) = url.host_str() else {
        return url_str.to_string();
    };

    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let rebuilt = format!("{}://{}{}", url.scheme(), authority, url.path());
    rebuilt.trim_end_matches('/').to_string()
}
