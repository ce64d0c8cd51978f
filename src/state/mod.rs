//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: The lifecycle of a single crawl run
//! - `Stats`: Counters for the outcomes of processed work items

mod phase;
mod stats;

// Re-export main types
pub use phase::CrawlPhase;
pub use stats::Stats;
