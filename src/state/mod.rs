//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: lifecycle of a crawl session (idle, running, paused, stopped, ...)
//! - `CrawlSession`: the visited set, counters, and output location of one session
//! - `SessionId`: opaque session identifier used by the registry

mod crawl_state;
mod session;

// Re-export main types
pub use crawl_state::CrawlState;
pub use session::{CrawlSession, SessionId};
