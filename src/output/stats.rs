//! Crawl summary statistics
//!
//! This module tallies what a session did and renders it for the console.

use crate::crawler::{AssetKind, AssetOutcome};
use crate::state::{CrawlSession, CrawlState};
use chrono::{DateTime, Utc};

/// Summary of one finished crawl session
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub session_id: String,
    pub seed_url: String,
    pub seed_domain: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Final lifecycle state
    pub state: CrawlState,

    /// Pages dequeued and counted
    pub pages_visited: u64,

    /// Pages whose content file was written
    pub pages_saved: u64,

    /// Pages whose fetch failed
    pub page_failures: u64,

    pub images_downloaded: u64,
    pub documents_downloaded: u64,

    /// Assets skipped because the file already existed
    pub assets_present: u64,

    pub asset_failures: u64,
}

impl CrawlSummary {
    pub fn new(session: &CrawlSession) -> Self {
        Self {
            session_id: session.id.to_string(),
            seed_url: session.seed_url.clone(),
            seed_domain: session.seed_domain.clone(),
            started_at: Utc::now(),
            finished_at: None,
            state: CrawlState::Running,
            pages_visited: 0,
            pages_saved: 0,
            page_failures: 0,
            images_downloaded: 0,
            documents_downloaded: 0,
            assets_present: 0,
            asset_failures: 0,
        }
    }

    /// Counts one asset outcome
    pub fn record_asset(&mut self, kind: AssetKind, outcome: &AssetOutcome) {
        match (outcome, kind) {
            (AssetOutcome::Downloaded { .. }, AssetKind::Image) => self.images_downloaded += 1,
            (AssetOutcome::Downloaded { .. }, AssetKind::Document) => {
                self.documents_downloaded += 1
            }
            (AssetOutcome::AlreadyPresent { .. }, _) => self.assets_present += 1,
            (AssetOutcome::Failed { .. }, _) => self.asset_failures += 1,
        }
    }

    /// Copies the page counters from the session and stamps the finish time
    pub fn finish(&mut self, session: &CrawlSession, state: CrawlState) {
        self.pages_visited = session.pages_visited;
        self.pages_saved = session.pages_saved;
        self.page_failures = session.page_failures;
        self.state = state;
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration in seconds, if finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Percentage of visited pages that were saved
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            0.0
        } else {
            (self.pages_saved as f64 / self.pages_visited as f64) * 100.0
        }
    }
}

/// Formats a summary for display
pub fn format_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Summary ===\n\n");
    out.push_str(&format!("Session: {}\n", summary.session_id));
    out.push_str(&format!(
        "Seed: {} (scope: {})\n",
        summary.seed_url, summary.seed_domain
    ));
    out.push_str(&format!("State: {}\n", summary.state));
    out.push_str(&format!("Started: {}\n", summary.started_at.to_rfc3339()));
    if let Some(duration) = summary.duration_seconds() {
        out.push_str(&format!("Duration: {} seconds\n", duration));
    }
    out.push('\n');

    out.push_str("Pages:\n");
    out.push_str(&format!("  Visited: {}\n", summary.pages_visited));
    out.push_str(&format!("  Saved: {}\n", summary.pages_saved));
    out.push_str(&format!("  Failed: {}\n", summary.page_failures));
    out.push('\n');

    out.push_str("Assets:\n");
    out.push_str(&format!("  Images downloaded: {}\n", summary.images_downloaded));
    out.push_str(&format!(
        "  Documents downloaded: {}\n",
        summary.documents_downloaded
    ));
    out.push_str(&format!("  Already present: {}\n", summary.assets_present));
    out.push_str(&format!("  Failed: {}\n", summary.asset_failures));
    out.push('\n');

    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} pages saved)\n",
        summary.success_rate(),
        summary.pages_saved,
        summary.pages_visited
    ));

    out
}

/// Prints a summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    print!("{}", format_summary(summary));
}
