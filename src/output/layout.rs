//! Session output layout
//!
//! Each session writes under `<root>/<session>/`:
//!
//! ```text
//! content/<key>.md      one file per visited page
//! images/<key>.<ext>    downloaded images
//! documents/<key>.<ext> downloaded documents
//! ```

use crate::crawler::{AssetKind, PageRecord};
use crate::url::url_key;
use std::path::{Path, PathBuf};

/// Directory layout of one session's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLayout {
    pub root: PathBuf,
    pub content_dir: PathBuf,
    pub images_dir: PathBuf,
    pub documents_dir: PathBuf,
}

impl SessionLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            content_dir: root.join("content"),
            images_dir: root.join("images"),
            documents_dir: root.join("documents"),
        }
    }

    /// Creates all output directories
    pub async fn create(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.content_dir).await?;
        tokio::fs::create_dir_all(&self.images_dir).await?;
        tokio::fs::create_dir_all(&self.documents_dir).await?;
        Ok(())
    }

    /// Folder an asset kind is stored in
    pub fn asset_dir(&self, kind: AssetKind) -> &Path {
        match kind {
            AssetKind::Image => &self.images_dir,
            AssetKind::Document => &self.documents_dir,
        }
    }

    /// Path of the content file for `url`
    pub fn content_path(&self, url: &str) -> PathBuf {
        self.content_dir.join(format!("{}.md", url_key(url)))
    }

    /// Writes the content file for a page, replacing any previous version
    pub async fn write_page(&self, url: &str, page: &PageRecord) -> std::io::Result<PathBuf> {
        let path = self.content_path(url);
        tokio::fs::write(&path, format_page(url, page)).await?;
        Ok(path)
    }
}

/// Renders the content file body for a page
pub fn format_page(url: &str, page: &PageRecord) -> String {
    format!(
        "# {}\n\n**Description:** {}\n\n**URL:** {}\n\n---\n\n{}",
        page.title, page.description, url, page.markdown
    )
}
