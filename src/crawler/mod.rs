//! Crawler module for document fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and the robots.txt gate
//! - The recrawl policy
//! - Checkpointing and resumption
//! - Overall crawl coordination

mod checkpoint;
mod coordinator;
mod fetcher;
mod queue;
mod recrawl;
mod stop;

pub use checkpoint::{resume_index, CheckpointManager};
pub use coordinator::{CrawlReport, Coordinator};
pub use fetcher::{
    backoff_delay, build_http_client, FetchError, FetchedPage, Fetcher, RETRYABLE_STATUSES,
};
pub use queue::{build_work_queue, WorkItem};
pub use recrawl::{age_days, is_due};
pub use stop::StopController;

use crate::config::Config;
use crate::storage::SqliteStorage;
use crate::CrawlerError;
use std::path::Path;

/// Runs a complete crawl against the configured SQLite database
///
/// This opens the store named in `[db]`, then runs a [`Coordinator`] until
/// the work queue is drained or `stop` is set.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `stop` - Stop flag checked before every work item
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished (drained or stopped)
/// * `Err(CrawlerError)` - The store could not be opened
pub async fn crawl(config: Config, stop: StopController) -> Result<CrawlReport, CrawlerError> {
    let storage = SqliteStorage::new(Path::new(&config.db.path), &config.db.collection)?;
    let mut coordinator = Coordinator::new(config, storage, stop)?;
    coordinator.run().await
}
