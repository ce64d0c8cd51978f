//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Change-aware document upserts with version history
//! - Source/time and content-hash lookups
//! - The singleton checkpoint record used for resumption
//! - Append-only run statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::Stats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum title length kept on a document, in characters
pub const MAX_TITLE_CHARS: usize = 200;

/// A fetched document as persisted in the documents collection
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlDocument {
    /// Canonical URL, unique across the collection
    pub url: String,
    /// URL as it appeared in the work queue
    pub original_url: String,
    pub content: String,
    /// Digest of `content`
    pub content_hash: String,
    pub title: String,
    pub source: String,
    /// Seconds since the Unix epoch
    pub crawl_timestamp: i64,
    pub response_code: u16,
    pub content_length: u64,
    pub content_type: String,
    pub last_modified: Option<String>,
    /// Superseded versions, oldest first
    pub previous_versions: Vec<VersionSnapshot>,
}

/// A superseded document version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub content_hash: String,
    pub crawl_timestamp: i64,
    pub title: String,
}

/// Result of a change-aware upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsertOutcome {
    /// No record existed for the URL
    New,
    /// Record existed with the same content hash; only the crawl time moved
    Unchanged,
    /// Record existed with different content; the old version went to history
    Updated,
}

/// The singleton progress marker for one crawler identity
#[derive(Debug, Clone)]
pub struct CheckpointRecord {
    pub crawler_id: String,
    pub last_url: String,
    pub timestamp: DateTime<Utc>,
    pub stats: Stats,
}

/// Final statistics of a run, appended once per run
#[derive(Debug, Clone)]
pub struct StatisticsRecord {
    pub timestamp: DateTime<Utc>,
    pub stats: Stats,
    /// Names of the configured sources
    pub sources: Vec<String>,
    pub delay_between_requests: f64,
}
