/// Crawl state definitions for tracking a session's lifecycle
///
/// A session moves `Idle → Running → {Paused ⇄ Running} → {Stopped | Completed | Failed}`.
use std::fmt;

/// Represents the current state of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlState {
    // ===== Initial State =====
    /// No traversal has started yet
    #[default]
    Idle,

    // ===== Active States =====
    /// The traversal is walking the frontier
    Running,

    /// The traversal is parked at a check point until resumed or stopped
    Paused,

    // ===== Terminal States =====
    /// An operator stopped the crawl
    Stopped,

    /// The frontier was exhausted (or the page cap reached)
    Completed,

    /// The crawl aborted before any page was saved
    Failed,
}

impl CrawlState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Failed)
    }

    /// Returns true if a traversal is in flight (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running | Paused, Stopped | Completed | Failed)
        )
    }

    /// Returns the lowercase label for this state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
