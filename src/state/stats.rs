//! Run counters

use crate::storage::UpsertOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome counters of a crawl run
///
/// Serialized into every checkpoint and into the final statistics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Documents fetched and stored, whatever the upsert outcome
    pub total_crawled: u64,
    pub new_documents: u64,
    pub updated_documents: u64,
    /// Items left as they were: not due for a recrawl, or refetched with
    /// identical content
    pub skipped_documents: u64,
    pub failed_documents: u64,
    pub start_time: DateTime<Utc>,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    /// Creates zeroed counters starting now
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(start_time: DateTime<Utc>) -> Self {
        Self {
            total_crawled: 0,
            new_documents: 0,
            updated_documents: 0,
            skipped_documents: 0,
            failed_documents: 0,
            start_time,
        }
    }

    /// Records a stored document
    ///
    /// An unchanged refetch counts as crawled and as skipped.
    pub fn record_outcome(&mut self, outcome: UpsertOutcome) {
        self.total_crawled += 1;
        match outcome {
            UpsertOutcome::New => self.new_documents += 1,
            UpsertOutcome::Updated => self.updated_documents += 1,
            UpsertOutcome::Unchanged => self.skipped_documents += 1,
        }
    }

    pub fn record_skip(&mut self) {
        self.skipped_documents += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed_documents += 1;
    }

    /// Seconds since `start_time`, never negative
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.start_time).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }

    /// Crawled documents per second
    pub fn rate(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = self.elapsed_seconds(now);
        if elapsed > 0.0 {
            self.total_crawled as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Multi-line block used for periodic and final log output
    pub fn summary_block(&self, now: DateTime<Utc>) -> String {
        format!(
            "Crawl statistics:\n  \
             Total crawled: {}\n  \
             New documents: {}\n  \
             Updated documents: {}\n  \
             Skipped documents: {}\n  \
             Failed documents: {}\n  \
             Elapsed: {:.1}s ({:.2} docs/sec)",
            self.total_crawled,
            self.new_documents,
            self.updated_documents,
            self.skipped_documents,
            self.failed_documents,
            self.elapsed_seconds(now),
            self.rate(now),
        )
    }
}
