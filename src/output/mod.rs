//! Output module for crawl artifacts and summaries
//!
//! This module handles:
//! - The on-disk layout of a session (content, images, documents)
//! - Writing one Markdown file per visited page
//! - Tallying and printing crawl statistics

mod layout;
pub mod stats;

pub use layout::{format_page, SessionLayout};
pub use stats::{format_summary, print_summary, CrawlSummary};
