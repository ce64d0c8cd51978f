//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the other components
//! together:
//! - Building the work queue and locating the resume position
//! - Gating each item on the recrawl policy
//! - Fetching, normalizing and storing documents
//! - Checkpointing after every stored document
//! - Honoring the stop flag and writing final statistics

use crate::config::Config;
use crate::crawler::checkpoint::{resume_index, CheckpointManager};
use crate::crawler::queue::{build_work_queue, WorkItem};
use crate::crawler::recrawl::is_due;
use crate::crawler::{Fetcher, StopController};
use crate::normalize::{canonical_url, derive_document};
use crate::state::{CrawlPhase, Stats};
use crate::storage::{StatisticsRecord, Storage, UpsertOutcome};
use crate::CrawlerError;
use chrono::Utc;

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub stats: Stats,
    /// Phase the run ended in (always `Finished` for a completed `run`)
    pub phase: CrawlPhase,
    /// True if the run ended because the stop flag was set
    pub stopped: bool,
    /// Size of the work queue
    pub queued: usize,
    /// Queue position the run started from
    pub resumed_at: usize,
    /// Work items taken from the queue, whatever their outcome
    pub processed: usize,
}

/// What happened to a single work item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    /// Stored copy is still fresh; nothing fetched
    Skipped,
    Stored(UpsertOutcome),
    /// robots.txt disallows the URL
    Denied,
    Failed,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: Storage> {
    config: Config,
    storage: S,
    fetcher: Fetcher,
    checkpoints: CheckpointManager,
    stop: StopController,
    phase: CrawlPhase,
    stats: Stats,
}

impl<S: Storage> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `storage` - An opened storage backend
    /// * `stop` - Stop flag, usually shared with signal handlers
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlerError)` - The HTTP client could not be built
    pub fn new(config: Config, storage: S, stop: StopController) -> Result<Self, CrawlerError> {
        let fetcher = Fetcher::new(&config.logic, &config.robots_txt)?;
        let checkpoints = CheckpointManager::new(config.crawler.id.clone());

        Ok(Self {
            config,
            storage,
            fetcher,
            checkpoints,
            stop,
            phase: CrawlPhase::Initializing,
            stats: Stats::new(),
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Moves to the next phase, rejecting transitions the lifecycle does not allow
    fn transition(&mut self, next: CrawlPhase) -> Result<(), CrawlerError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlerError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::info!("Crawl phase: {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Runs the crawl until the queue is exhausted or a stop is requested
    ///
    /// Per-item failures are counted and logged; they never end the run.
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlerError> {
        // Initializing
        self.stats = Stats::new();
        if let Err(e) = self.storage.create_indexes() {
            tracing::warn!("Failed to create indexes, continuing without them: {}", e);
        }

        let queue = build_work_queue(&self.config);
        tracing::info!("Total URLs to crawl: {}", queue.len());

        // Resuming
        self.transition(CrawlPhase::Resuming)?;
        let last_url = match self.checkpoints.load(&self.storage) {
            Ok(checkpoint) => checkpoint.map(|c| c.last_url),
            Err(e) => {
                tracing::warn!("{}; starting from the beginning", e);
                None
            }
        };

        let start = resume_index(&queue, last_url.as_deref());
        if start > 0 {
            tracing::info!(
                "Resuming after {} at position {}/{}",
                last_url.as_deref().unwrap_or_default(),
                start,
                queue.len()
            );
        }

        // Running
        self.transition(CrawlPhase::Running)?;
        let delay = self.config.logic.request_delay();
        let stats_interval = self.config.logic.stats_interval.max(1);
        let mut processed = 0;
        let mut last_stored: Option<&str> = None;
        let mut stopped = false;

        for item in &queue[start..] {
            if self.stop.is_stopped() {
                tracing::info!("Stop requested, leaving the crawl loop");
                stopped = true;
                break;
            }

            processed += 1;
            let outcome = self.process_item(item).await;

            if let ItemOutcome::Stored(_) = outcome {
                last_stored = Some(&item.url);
                if self.stats.total_crawled % stats_interval == 0 {
                    tracing::info!("{}", self.stats.summary_block(Utc::now()));
                }
            }

            if outcome != ItemOutcome::Skipped && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        // Stopping | Draining
        self.transition(if stopped {
            CrawlPhase::Stopping
        } else {
            CrawlPhase::Draining
        })?;

        // Finished
        tracing::info!("{}", self.stats.summary_block(Utc::now()));
        if let Some(url) = last_stored {
            if let Err(e) = self.checkpoints.save(&mut self.storage, url, &self.stats) {
                tracing::error!("{}", e);
            }
        }
        self.save_final_statistics();
        self.transition(CrawlPhase::Finished)?;

        Ok(CrawlReport {
            stats: self.stats.clone(),
            phase: self.phase,
            stopped,
            queued: queue.len(),
            resumed_at: start,
            processed,
        })
    }

    /// Processes one work item: recrawl gate, fetch, normalize, upsert, checkpoint
    async fn process_item(&mut self, item: &WorkItem) -> ItemOutcome {
        let canonical = canonical_url(&item.url, item.kind);

        let existing = match self.storage.get_document(&canonical) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::error!("Failed to look up {}: {}", canonical, e);
                self.stats.record_failure();
                return ItemOutcome::Failed;
            }
        };

        let now = Utc::now().timestamp();
        if !is_due(existing.as_ref(), now, self.config.logic.refresh_interval_days) {
            tracing::debug!("Skipping {}, crawled recently", canonical);
            self.stats.record_skip();
            return ItemOutcome::Skipped;
        }

        tracing::info!("Fetching {}", canonical);
        let page = match self.fetcher.fetch(&item.url).await {
            Ok(page) => page,
            Err(e) if !e.counts_as_failure() => {
                tracing::warn!("Skipping {}: {}", item.url, e);
                return ItemOutcome::Denied;
            }
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", item.url, e);
                self.stats.record_failure();
                return ItemOutcome::Failed;
            }
        };

        let document = derive_document(
            &item.url,
            &item.source_name,
            item.kind,
            &page,
            Utc::now().timestamp(),
        );

        let outcome = match self.storage.upsert_document(&document) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to store {}: {}", document.url, e);
                self.stats.record_failure();
                return ItemOutcome::Failed;
            }
        };

        match outcome {
            UpsertOutcome::New => tracing::info!("New document: {}", document.title),
            UpsertOutcome::Updated => tracing::info!("Updated document: {}", document.title),
            UpsertOutcome::Unchanged => tracing::debug!("Unchanged document: {}", document.url),
        }
        self.stats.record_outcome(outcome);

        if let Err(e) = self.checkpoints.save(&mut self.storage, &item.url, &self.stats) {
            tracing::error!("{}", e);
        }

        ItemOutcome::Stored(outcome)
    }

    /// Appends the run's statistics record; failures are logged
    fn save_final_statistics(&mut self) {
        let record = StatisticsRecord {
            timestamp: Utc::now(),
            stats: self.stats.clone(),
            sources: self.config.sources.keys().cloned().collect(),
            delay_between_requests: self.config.logic.delay_between_requests,
        };

        match self.storage.insert_statistics(&record) {
            Ok(id) => tracing::info!("Final statistics saved (record {})", id),
            Err(e) => tracing::error!("Failed to save final statistics: {}", e),
        }
    }
}
