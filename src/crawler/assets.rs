//! Asset downloads
//!
//! Images and documents referenced by a page are saved under the session's
//! `images/` and `documents/` folders. Downloads are idempotent (an existing file
//! is never fetched again) and never fail the caller: every outcome, including
//! errors, is returned as an `AssetOutcome`. Bodies are streamed to a `.part`
//! file and renamed into place once complete.

use crate::url::{infer_extension, url_key};
use reqwest::{Client, Response};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Category of a downloaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Document,
}

impl AssetKind {
    /// Extension used when none can be inferred from the URL
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Image => "jpg",
            Self::Document => "dat",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Document => f.write_str("document"),
        }
    }
}

/// What happened to one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Fetched and written
    Downloaded { path: PathBuf, bytes: u64 },

    /// A file with the computed name already existed; no request was made
    AlreadyPresent { path: PathBuf },

    /// Network or I/O failure; the crawl carries on
    Failed { reason: String },
}

/// Event delivered to the optional asset hook
#[derive(Debug, Clone)]
pub struct AssetEvent {
    pub url: String,
    pub kind: AssetKind,
    pub outcome: AssetOutcome,
}

/// Computes the file name an asset URL is stored under
///
/// # Examples
///
/// ```
/// use sumi_gleaner::crawler::{asset_file_name, AssetKind};
///
/// let name = asset_file_name("https://example.com/img/logo.png", AssetKind::Image);
/// assert!(name.ends_with(".png"));
///
/// let name = asset_file_name("https://example.com/download", AssetKind::Document);
/// assert!(name.ends_with(".dat"));
/// ```
pub fn asset_file_name(url: &str, kind: AssetKind) -> String {
    let ext = infer_extension(url).unwrap_or_else(|| kind.default_extension().to_string());
    format!("{}.{}", url_key(url), ext)
}

/// Downloads an asset into `destination_dir`
///
/// Skips the request entirely when the target file already exists. Failures are
/// reported through the returned outcome, never as an error.
pub async fn download_asset(
    client: &Client,
    url: &str,
    destination_dir: &Path,
    kind: AssetKind,
) -> AssetOutcome {
    let path = destination_dir.join(asset_file_name(url, kind));

    match tokio::fs::try_exists(&path).await {
        Ok(true) => return AssetOutcome::AlreadyPresent { path },
        Ok(false) => {}
        Err(e) => {
            return AssetOutcome::Failed {
                reason: format!("cannot check {}: {}", path.display(), e),
            }
        }
    }

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            return AssetOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    if !response.status().is_success() {
        return AssetOutcome::Failed {
            reason: format!("HTTP {}", response.status().as_u16()),
        };
    }

    if let Err(e) = tokio::fs::create_dir_all(destination_dir).await {
        return AssetOutcome::Failed {
            reason: format!("cannot create {}: {}", destination_dir.display(), e),
        };
    }

    // Only a complete body is renamed to the final name
    let partial = partial_path(&path);
    let outcome = match stream_to_file(response, &partial).await {
        Ok(bytes) => match tokio::fs::rename(&partial, &path).await {
            Ok(()) => return AssetOutcome::Downloaded { path, bytes },
            Err(e) => format!("cannot rename {}: {}", partial.display(), e),
        },
        Err(reason) => reason,
    };

    if let Err(e) = tokio::fs::remove_file(&partial).await {
        tracing::debug!(path = %partial.display(), error = %e, "Could not remove partial download");
    }
    AssetOutcome::Failed { reason: outcome }
}

/// Streams the response body into `path` chunk by chunk
async fn stream_to_file(mut response: Response, path: &Path) -> Result<u64, String> {
    let write_error = |e: std::io::Error| format!("cannot write {}: {}", path.display(), e);

    let mut file = tokio::fs::File::create(path).await.map_err(write_error)?;
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
        file.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(write_error)?;
    Ok(written)
}

/// `<path>.part`, the name a download is written under until it completes
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
