//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with content-type filtering
//! - HTML extraction and Markdown conversion
//! - Image and document downloads
//! - Cooperative pause/stop control
//! - The traversal engine and the session registry

mod assets;
mod control;
mod engine;
mod extract;
mod fetcher;
mod markdown;
mod registry;

pub use assets::{asset_file_name, download_asset, AssetEvent, AssetKind, AssetOutcome};
pub use control::CrawlControl;
pub use engine::{AssetCallback, CrawlEngine};
pub use extract::{extract_page, PageRecord};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use markdown::{to_markdown, NON_CONTENT_TAGS};
pub use registry::SessionRegistry;
