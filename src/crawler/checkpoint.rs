//! Checkpoint management for resumable runs

use crate::crawler::WorkItem;
use crate::state::Stats;
use crate::storage::{CheckpointRecord, Storage};
use crate::CrawlerError;

/// Saves and restores the progress marker of one crawler identity
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    crawler_id: String,
}

impl CheckpointManager {
    pub fn new(crawler_id: impl Into<String>) -> Self {
        Self {
            crawler_id: crawler_id.into(),
        }
    }

    /// Overwrites the checkpoint with the last processed URL and counters
    pub fn save<S: Storage + ?Sized>(
        &self,
        storage: &mut S,
        last_url: &str,
        stats: &Stats,
    ) -> Result<(), CrawlerError> {
        storage
            .save_checkpoint(&self.crawler_id, last_url, stats)
            .map_err(|e| CrawlerError::Checkpoint(format!("save failed: {}", e)))
    }

    /// Loads the checkpoint, if one exists
    pub fn load<S: Storage + ?Sized>(
        &self,
        storage: &S,
    ) -> Result<Option<CheckpointRecord>, CrawlerError> {
        storage
            .load_checkpoint(&self.crawler_id)
            .map_err(|e| CrawlerError::Checkpoint(format!("load failed: {}", e)))
    }

    /// Forgets the checkpoint so the next run starts from the beginning
    pub fn clear<S: Storage + ?Sized>(&self, storage: &mut S) -> Result<(), CrawlerError> {
        storage
            .clear_checkpoint(&self.crawler_id)
            .map_err(|e| CrawlerError::Checkpoint(format!("clear failed: {}", e)))
    }
}

/// Position to resume from: the item after the first one whose URL equals
/// `last_url`, or 0 when there is no checkpoint or its URL is not queued
pub fn resume_index(queue: &[WorkItem], last_url: Option<&str>) -> usize {
    last_url
        .and_then(|last| queue.iter().position(|item| item.url == last))
        .map(|index| index + 1)
        .unwrap_or(0)
}
