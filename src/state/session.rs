//! Per-session crawl data
//!
//! A `CrawlSession` is owned by the task running the traversal. Only the control
//! flags are shared with other threads (see `crawler::CrawlControl`); the visited set
//! and counters below are never touched from outside the traversal.

use crate::url::normalize;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque identifier for one crawl session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a form of the id that is safe to use as a single directory name
    pub fn dir_name(&self) -> String {
        let cleaned: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.is_empty() {
            "_".to_string()
        } else {
            cleaned
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// The traversal-owned state of one crawl
#[derive(Debug)]
pub struct CrawlSession {
    pub id: SessionId,
    pub seed_url: String,
    /// Scope domain of the seed; links outside it are never traversed
    pub seed_domain: String,
    pub max_depth: u32,
    pub output_dir: PathBuf,
    visited: HashSet<String>,
    /// Pages dequeued and counted (reported through `on_progress`)
    pub pages_visited: u64,
    /// Pages whose content file was written
    pub pages_saved: u64,
    pub page_failures: u64,
}

impl CrawlSession {
    pub fn new(
        id: SessionId,
        seed_url: impl Into<String>,
        max_depth: u32,
        output_root: &Path,
    ) -> Self {
        let seed_url = seed_url.into();
        let seed_domain = crate::url::scope_domain(&seed_url);
        let output_dir = output_root.join(id.dir_name());

        Self {
            id,
            seed_url,
            seed_domain,
            max_depth,
            output_dir,
            visited: HashSet::new(),
            pages_visited: 0,
            pages_saved: 0,
            page_failures: 0,
        }
    }

    /// Marks a URL as visited
    ///
    /// Returns false if its normalized form was already in the set.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(normalize(url))
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&normalize(url))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
