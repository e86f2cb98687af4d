use super::normalize::{normalize, parse_lenient};
use sha2::{Digest, Sha256};

/// Path suffixes that mark a link as a downloadable document rather than a page
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".docx", ".doc", ".xlsx", ".xls", ".pptx", ".ppt", ".txt", ".zip", ".csv",
];

/// Number of hex characters kept from the SHA-256 digest
const KEY_LEN: usize = 16;

/// Computes the stable file key for a URL
///
/// The key is derived from the normalized URL only, so every variant of a URL that
/// normalizes to the same string maps to the same file. Re-running a crawl
/// overwrites content files in place and finds existing assets on disk.
///
/// # Examples
///
/// ```
/// use sumi_gleaner::url::url_key;
///
/// let a = url_key("https://example.com/page?x=1");
/// let b = url_key("https://example.com/page/");
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 16);
/// ```
pub fn url_key(url_str: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(url_str).as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..KEY_LEN].to_string()
}

/// Returns true if the URL's path ends in one of the document extensions
pub fn is_document_url(url_str: &str) -> bool {
    let path = match parse_lenient(url_str) {
        Some(url) => url.path().to_lowercase(),
        None => return false,
    };
    DOCUMENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Infers a file extension from the last path segment of a URL
///
/// Only extensions of 2 to 4 alphanumeric characters are accepted; anything else
/// yields `None` and the caller falls back to a kind-specific default.
pub fn infer_extension(url_str: &str) -> Option<String> {
    let url = parse_lenient(url_str)?;
    let segment = url.path_segments()?.last()?;
    let (_, ext) = segment.rsplit_once('.')?;

    if (2..=4).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}
