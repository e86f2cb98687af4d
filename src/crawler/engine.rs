//! Crawl engine - site-scoped traversal
//!
//! This module contains the traversal that drives a crawl session:
//! - Resetting the session's flags, counters and visited set
//! - Walking the frontier depth-first with an explicit work stack
//! - Fetching, converting and writing each page
//! - Dispatching images, then documents, to the asset fetcher
//! - Honoring pause/stop requests at every check point

use crate::config::{Config, CrawlerConfig};
use crate::crawler::assets::{download_asset, AssetEvent, AssetKind};
use crate::crawler::control::CrawlControl;
use crate::crawler::extract::extract_page;
use crate::crawler::{build_http_client, fetch_url};
use crate::output::{CrawlSummary, SessionLayout};
use crate::state::{CrawlSession, CrawlState, SessionId};
use crate::url::{in_scope, normalize};
use crate::GleanError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Observer for asset outcomes, including swallowed failures
pub type AssetCallback = Arc<dyn Fn(&AssetEvent) + Send + Sync>;

/// A URL waiting on the work stack
#[derive(Debug, Clone)]
struct FrontierEntry {
    url: String,
    depth: u32,
}

/// Runs crawl sessions for one site at a time
///
/// The engine owns the HTTP client and a `CrawlControl`. Pause, resume and stop
/// may be called from any thread while `start` is running.
pub struct CrawlEngine {
    client: Client,
    crawler: CrawlerConfig,
    output_root: PathBuf,
    control: CrawlControl,
    on_asset: Option<AssetCallback>,
}

impl CrawlEngine {
    /// Creates an engine from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Engine ready to start a session
    /// * `Err(GleanError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, GleanError> {
        let client = build_http_client(&config.user_agent, &config.http)?;

        Ok(Self {
            client,
            crawler: config.crawler.clone(),
            output_root: PathBuf::from(&config.output.root_dir),
            control: CrawlControl::new(),
            on_asset: None,
        })
    }

    /// Registers a hook that sees every asset outcome
    pub fn with_asset_hook(mut self, hook: AssetCallback) -> Self {
        self.on_asset = Some(hook);
        self
    }

    /// Returns a handle that shares this engine's flags
    pub fn control(&self) -> CrawlControl {
        self.control.clone()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn state(&self) -> CrawlState {
        self.control.state()
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Runs a crawl session to completion
    ///
    /// `on_log` receives free-text progress lines; `on_progress` receives the
    /// cumulative page count after each newly visited page.
    ///
    /// # Failure Semantics
    ///
    /// | Failure | Effect |
    /// |---------|--------|
    /// | Asset download | Counted in the summary, never raised |
    /// | Page fetch | Logged, that branch is abandoned |
    /// | Session-level, pages saved | Logged, returns `Ok` (partial success) |
    /// | Session-level, nothing saved | Returns `GleanError::StartFailed` |
    ///
    /// A stop request makes this return `Ok` with state `Stopped`.
    pub async fn start<L, P>(
        &self,
        session_id: impl Into<SessionId>,
        seed_url: &str,
        max_depth: u32,
        on_log: L,
        on_progress: P,
    ) -> Result<CrawlSummary, GleanError>
    where
        L: Fn(String) + Send + Sync,
        P: Fn(u64) + Send + Sync,
    {
        self.control.begin();

        let seed = normalize(seed_url);
        let mut session = CrawlSession::new(session_id.into(), seed, max_depth, &self.output_root);
        let mut summary = CrawlSummary::new(&session);

        tracing::info!(
            session = %session.id,
            seed = %session.seed_url,
            max_depth,
            "Starting crawl"
        );
        on_log(format!(
            "Starting crawl of {} (scope: {}, max depth {})",
            session.seed_url, session.seed_domain, max_depth
        ));

        let outcome = self
            .traverse(&mut session, &mut summary, &on_log, &on_progress)
            .await;

        match outcome {
            Ok(()) => {
                let state = if self.control.is_stopped() {
                    tracing::info!(session = %session.id, pages = session.pages_visited, "Crawl stopped");
                    on_log(format!(
                        "Crawl stopped after {} pages",
                        session.pages_visited
                    ));
                    CrawlState::Stopped
                } else {
                    tracing::info!(session = %session.id, pages = session.pages_visited, "Crawl completed");
                    on_log(format!(
                        "Crawl complete: {} pages visited, {} saved",
                        session.pages_visited, session.pages_saved
                    ));
                    CrawlState::Completed
                };

                self.control.transition(state)?;
                summary.finish(&session, state);
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(session = %session.id, error = %e, "Crawl aborted");
                on_log(format!("Crawl error: {}", e));

                if session.pages_saved > 0 {
                    on_log(format!(
                        "Crawl ended early with {} pages saved (partial result)",
                        session.pages_saved
                    ));
                    self.control.transition(CrawlState::Completed)?;
                    summary.finish(&session, CrawlState::Completed);
                    Ok(summary)
                } else {
                    self.control.transition(CrawlState::Failed)?;
                    Err(GleanError::StartFailed {
                        session: session.id.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
    }

    /// Walks the frontier until it is empty or a stop is requested
    ///
    /// Page-level failures are handled here; only session-level failures (output
    /// directories, content writes) are returned.
    async fn traverse<L, P>(
        &self,
        session: &mut CrawlSession,
        summary: &mut CrawlSummary,
        on_log: &L,
        on_progress: &P,
    ) -> Result<(), GleanError>
    where
        L: Fn(String) + Send + Sync,
        P: Fn(u64) + Send + Sync,
    {
        let layout = SessionLayout::new(&session.output_dir);
        layout.create().await?;

        let poll = Duration::from_millis(self.crawler.pause_poll_interval_ms);
        let mut frontier = vec![FrontierEntry {
            url: session.seed_url.clone(),
            depth: 0,
        }];

        while let Some(entry) = frontier.pop() {
            if self.control.is_stopped() {
                return Ok(());
            }
            if !self.control.wait_while_paused(poll).await {
                return Ok(());
            }

            if entry.depth > session.max_depth {
                continue;
            }

            if session.is_visited(&entry.url) {
                tracing::trace!(url = %entry.url, "Already visited");
                continue;
            }

            if let Some(cap) = self.crawler.max_pages {
                if session.pages_visited >= cap {
                    on_log(format!("Page limit of {} reached", cap));
                    return Ok(());
                }
            }

            session.mark_visited(&entry.url);

            session.pages_visited += 1;
            on_progress(session.pages_visited);
            tracing::info!(session = %session.id, url = %entry.url, depth = entry.depth, "Crawling");
            on_log(format!("Crawling [depth {}]: {}", entry.depth, entry.url));

            let (final_url, body) = match fetch_url(&self.client, &entry.url)
                .await
                .into_page(&entry.url)
            {
                Ok(page) => page,
                Err(e) => {
                    session.page_failures += 1;
                    tracing::warn!(url = %entry.url, error = %e, "Page fetch failed");
                    on_log(format!("Failed to fetch {}: {}", entry.url, e));
                    continue;
                }
            };

            let base_url = match Url::parse(&final_url).or_else(|_| Url::parse(&entry.url)) {
                Ok(url) => url,
                Err(e) => {
                    session.page_failures += 1;
                    on_log(format!("Failed to parse {}: {}", entry.url, e));
                    continue;
                }
            };

            let page = extract_page(&body, &base_url);
            let path = layout.write_page(&entry.url, &page).await?;
            session.pages_saved += 1;
            tracing::debug!(url = %entry.url, path = %path.display(), "Saved page");

            for image in &page.images {
                if self.control.is_stopped() {
                    return Ok(());
                }
                self.fetch_asset(image, AssetKind::Image, &layout, summary)
                    .await;
            }

            for document in page.document_links() {
                if self.control.is_stopped() {
                    return Ok(());
                }
                self.fetch_asset(document, AssetKind::Document, &layout, summary)
                    .await;
            }

            let mut children = Vec::new();
            if entry.depth < session.max_depth {
                for link in page.page_links() {
                    if self.control.is_stopped() {
                        return Ok(());
                    }
                    if in_scope(&session.seed_domain, link) && !session.is_visited(link) {
                        children.push(link.to_string());
                    }
                }
            }

            // Reversed so the first link on the page is popped first
            frontier.extend(children.into_iter().rev().map(|url| FrontierEntry {
                url,
                depth: entry.depth + 1,
            }));
        }

        Ok(())
    }

    async fn fetch_asset(
        &self,
        url: &str,
        kind: AssetKind,
        layout: &SessionLayout,
        summary: &mut CrawlSummary,
    ) {
        let outcome = download_asset(&self.client, url, layout.asset_dir(kind), kind).await;
        tracing::debug!(url = %url, kind = %kind, outcome = ?outcome, "Asset processed");
        summary.record_asset(kind, &outcome);

        if let Some(hook) = &self.on_asset {
            hook(&AssetEvent {
                url: url.to_string(),
                kind,
                outcome,
            });
        }
    }
}
