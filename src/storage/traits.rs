//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::Stats;
use crate::storage::{CheckpointRecord, CrawlDocument, StatisticsRecord, UpsertOutcome};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// One backend holds three logical collections: the documents collection
/// (with version history), the checkpoint singleton per crawler identity,
/// and the append-only statistics log.
pub trait Storage {
    // ===== Documents =====

    /// Creates the secondary indexes (source/time and content hash)
    ///
    /// Safe to call repeatedly. Uniqueness of `url` does not depend on this.
    fn create_indexes(&mut self) -> StorageResult<()>;

    /// Gets a document and its version history by canonical URL
    fn get_document(&self, url: &str) -> StorageResult<Option<CrawlDocument>>;

    /// Inserts or updates a document, keeping superseded versions
    ///
    /// The lookup and the write run in a single transaction. An incoming
    /// document's own `previous_versions` is ignored: the stored history is
    /// always the existing history plus, on a content change, a snapshot of
    /// the existing record.
    fn upsert_document(&mut self, document: &CrawlDocument) -> StorageResult<UpsertOutcome>;

    /// Gets the most recently crawled documents of a source, newest first
    fn documents_by_source(&self, source: &str, limit: usize)
        -> StorageResult<Vec<CrawlDocument>>;

    /// Gets all documents whose current content has the given hash
    fn documents_by_hash(&self, content_hash: &str) -> StorageResult<Vec<CrawlDocument>>;

    /// Lists content hashes shared by more than one URL, with those URLs
    fn duplicate_content_groups(&self) -> StorageResult<Vec<(String, Vec<String>)>>;

    /// Gets total document count
    fn count_documents(&self) -> StorageResult<u64>;

    /// Counts documents per source, ordered by source name
    fn count_documents_by_source(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Checkpoints =====

    /// Overwrites the checkpoint of `crawler_id`
    fn save_checkpoint(&mut self, crawler_id: &str, last_url: &str, stats: &Stats)
        -> StorageResult<()>;

    /// Gets the checkpoint of `crawler_id`, if one was ever saved
    fn load_checkpoint(&self, crawler_id: &str) -> StorageResult<Option<CheckpointRecord>>;

    /// Removes the checkpoint of `crawler_id`
    fn clear_checkpoint(&mut self, crawler_id: &str) -> StorageResult<()>;

    // ===== Statistics =====

    /// Appends a statistics record, returning its row ID
    fn insert_statistics(&mut self, record: &StatisticsRecord) -> StorageResult<i64>;

    /// Gets the most recently appended statistics record
    fn latest_statistics(&self) -> StorageResult<Option<StatisticsRecord>>;
}
