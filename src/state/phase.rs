//! Lifecycle phases of a crawl run
//!
//! A run moves through `Initializing -> Resuming -> Running`, leaves
//! `Running` either by draining the queue or by a stop request, and
//! always ends in `Finished`.

use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Storage opened, work queue being built
    Initializing,

    /// Looking up the checkpoint to find the resume position
    Resuming,

    /// Processing work items
    Running,

    /// Stop flag observed; no further items will be taken
    Stopping,

    /// Work queue exhausted
    Draining,

    /// Final statistics and checkpoint written
    Finished,
}

impl CrawlPhase {
    /// Returns true if a run may move from this phase to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Initializing, Self::Resuming)
                | (Self::Resuming, Self::Running)
                | (Self::Running, Self::Stopping)
                | (Self::Running, Self::Draining)
                | (Self::Stopping, Self::Finished)
                | (Self::Draining, Self::Finished)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Resuming => "resuming",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Draining => "draining",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
