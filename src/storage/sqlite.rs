//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::Stats;
use crate::storage::schema::{create_indexes, initialize_schema, versions_table};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    CheckpointRecord, CrawlDocument, StatisticsRecord, UpsertOutcome, VersionSnapshot,
};
use crate::CrawlerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Column list shared by every document query; order matches `document_from_row`
const DOCUMENT_COLUMNS: &str = "url, original_url, content, content_hash, title, source, \
     crawl_timestamp, response_code, content_length, content_type, last_modified";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    collection: String,
    versions: String,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `collection` - Name of the documents table (validated by the config layer)
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlerError::Connection)` - Failed to open database or create tables
    pub fn new(path: &Path, collection: &str) -> Result<Self, CrawlerError> {
        let connection_error = |source| CrawlerError::Connection {
            path: path.display().to_string(),
            source,
        };

        let conn = Connection::open(path).map_err(connection_error)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(connection_error)?;

        initialize_schema(&conn, collection).map_err(connection_error)?;

        Ok(Self::from_connection(conn, collection))
    }

    /// Creates an in-memory database
    pub fn new_in_memory(collection: &str) -> Result<Self, CrawlerError> {
        let connection_error = |source| CrawlerError::Connection {
            path: ":memory:".to_string(),
            source,
        };

        let conn = Connection::open_in_memory().map_err(connection_error)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(connection_error)?;
        initialize_schema(&conn, collection).map_err(connection_error)?;
        Ok(Self::from_connection(conn, collection))
    }

    fn from_connection(conn: Connection, collection: &str) -> Self {
        Self {
            conn,
            collection: collection.to_string(),
            versions: versions_table(collection),
        }
    }

    /// Loads the version history of a URL, oldest first
    fn load_versions(&self, url: &str) -> StorageResult<Vec<VersionSnapshot>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT content_hash, crawl_timestamp, title FROM {} WHERE url = ?1 ORDER BY position ASC",
            self.versions
        ))?;

        let versions = stmt
            .query_map(params![url], |row| {
                Ok(VersionSnapshot {
                    content_hash: row.get(0)?,
                    crawl_timestamp: row.get(1)?,
                    title: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(versions)
    }

    /// Runs a document query and attaches the history of every row
    fn query_documents<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> StorageResult<Vec<CrawlDocument>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut documents = stmt
            .query_map(params, document_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for document in &mut documents {
            document.previous_versions = self.load_versions(&document.url)?;
        }

        Ok(documents)
    }
}

/// Maps a row selected with `DOCUMENT_COLUMNS`; history is loaded separately
fn document_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlDocument> {
    Ok(CrawlDocument {
        url: row.get(0)?,
        original_url: row.get(1)?,
        content: row.get(2)?,
        content_hash: row.get(3)?,
        title: row.get(4)?,
        source: row.get(5)?,
        crawl_timestamp: row.get(6)?,
        response_code: row.get(7)?,
        content_length: row.get::<_, i64>(8)? as u64,
        content_type: row.get(9)?,
        last_modified: row.get(10)?,
        previous_versions: Vec::new(),
    })
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp '{}': {}", value, e)))
}

impl Storage for SqliteStorage {
    // ===== Documents =====

    fn create_indexes(&mut self) -> StorageResult<()> {
        create_indexes(&self.conn, &self.collection)?;
        Ok(())
    }

    fn get_document(&self, url: &str) -> StorageResult<Option<CrawlDocument>> {
        let document = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE url = ?1",
                    DOCUMENT_COLUMNS, self.collection
                ),
                params![url],
                document_from_row,
            )
            .optional()?;

        match document {
            Some(mut document) => {
                document.previous_versions = self.load_versions(&document.url)?;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    fn upsert_document(&mut self, document: &CrawlDocument) -> StorageResult<UpsertOutcome> {
        let tx = self.conn.transaction()?;

        let existing: Option<(String, i64, String)> = tx
            .query_row(
                &format!(
                    "SELECT content_hash, crawl_timestamp, title FROM {} WHERE url = ?1",
                    self.collection
                ),
                params![document.url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    &format!(
                        "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                        self.collection, DOCUMENT_COLUMNS
                    ),
                    params![
                        document.url,
                        document.original_url,
                        document.content,
                        document.content_hash,
                        document.title,
                        document.source,
                        document.crawl_timestamp,
                        document.response_code,
                        document.content_length as i64,
                        document.content_type,
                        document.last_modified,
                    ],
                )?;
                UpsertOutcome::New
            }

            Some((existing_hash, _, _)) if existing_hash == document.content_hash => {
                tx.execute(
                    &format!(
                        "UPDATE {} SET crawl_timestamp = ?1 WHERE url = ?2",
                        self.collection
                    ),
                    params![document.crawl_timestamp, document.url],
                )?;
                UpsertOutcome::Unchanged
            }

            Some((existing_hash, existing_timestamp, existing_title)) => {
                let position: i64 = tx.query_row(
                    &format!(
                        "SELECT COALESCE(MAX(position) + 1, 0) FROM {} WHERE url = ?1",
                        self.versions
                    ),
                    params![document.url],
                    |row| row.get(0),
                )?;

                tx.execute(
                    &format!(
                        "INSERT INTO {} (url, position, content_hash, crawl_timestamp, title)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        self.versions
                    ),
                    params![
                        document.url,
                        position,
                        existing_hash,
                        existing_timestamp,
                        existing_title
                    ],
                )?;

                tx.execute(
                    &format!(
                        "UPDATE {} SET original_url = ?1, content = ?2, content_hash = ?3,
                         title = ?4, source = ?5, crawl_timestamp = ?6, response_code = ?7,
                         content_length = ?8, content_type = ?9, last_modified = ?10
                         WHERE url = ?11",
                        self.collection
                    ),
                    params![
                        document.original_url,
                        document.content,
                        document.content_hash,
                        document.title,
                        document.source,
                        document.crawl_timestamp,
                        document.response_code,
                        document.content_length as i64,
                        document.content_type,
                        document.last_modified,
                        document.url,
                    ],
                )?;
                UpsertOutcome::Updated
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn documents_by_source(
        &self,
        source: &str,
        limit: usize,
    ) -> StorageResult<Vec<CrawlDocument>> {
        self.query_documents(
            &format!(
                "SELECT {} FROM {} WHERE source = ?1 ORDER BY crawl_timestamp DESC LIMIT ?2",
                DOCUMENT_COLUMNS, self.collection
            ),
            params![source, limit as i64],
        )
    }

    fn documents_by_hash(&self, content_hash: &str) -> StorageResult<Vec<CrawlDocument>> {
        self.query_documents(
            &format!(
                "SELECT {} FROM {} WHERE content_hash = ?1 ORDER BY url",
                DOCUMENT_COLUMNS, self.collection
            ),
            params![content_hash],
        )
    }

    fn duplicate_content_groups(&self) -> StorageResult<Vec<(String, Vec<String>)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT content_hash, url FROM {collection}
             WHERE content_hash IN (
                 SELECT content_hash FROM {collection}
                 GROUP BY content_hash HAVING COUNT(*) > 1
             )
             ORDER BY content_hash, url",
            collection = self.collection
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for row in rows {
            let (hash, url) = row?;
            match groups.last_mut() {
                Some((current, urls)) if *current == hash => urls.push(url),
                _ => groups.push((hash, vec![url])),
            }
        }

        Ok(groups)
    }

    fn count_documents(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.collection),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_documents_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT source, COUNT(*) FROM {} GROUP BY source ORDER BY source",
            self.collection
        ))?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    // ===== Checkpoints =====

    fn save_checkpoint(
        &mut self,
        crawler_id: &str,
        last_url: &str,
        stats: &Stats,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let stats_json = serde_json::to_string(stats)?;

        self.conn.execute(
            "INSERT INTO crawler_checkpoints (crawler_id, last_url, timestamp, stats)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(crawler_id) DO UPDATE SET
                 last_url = excluded.last_url,
                 timestamp = excluded.timestamp,
                 stats = excluded.stats",
            params![crawler_id, last_url, now, stats_json],
        )?;
        Ok(())
    }

    fn load_checkpoint(&self, crawler_id: &str) -> StorageResult<Option<CheckpointRecord>> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT last_url, timestamp, stats FROM crawler_checkpoints WHERE crawler_id = ?1",
                params![crawler_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((last_url, timestamp, stats_json)) = row else {
            return Ok(None);
        };

        Ok(Some(CheckpointRecord {
            crawler_id: crawler_id.to_string(),
            last_url,
            timestamp: parse_timestamp(&timestamp)?,
            stats: serde_json::from_str(&stats_json)?,
        }))
    }

    fn clear_checkpoint(&mut self, crawler_id: &str) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM crawler_checkpoints WHERE crawler_id = ?1",
            params![crawler_id],
        )?;
        Ok(())
    }

    // ===== Statistics =====

    fn insert_statistics(&mut self, record: &StatisticsRecord) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO crawler_statistics (timestamp, stats, sources, delay_between_requests)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.timestamp.to_rfc3339(),
                serde_json::to_string(&record.stats)?,
                serde_json::to_string(&record.sources)?,
                record.delay_between_requests,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn latest_statistics(&self) -> StorageResult<Option<StatisticsRecord>> {
        let row: Option<(String, String, String, f64)> = self
            .conn
            .query_row(
                "SELECT timestamp, stats, sources, delay_between_requests
                 FROM crawler_statistics ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((timestamp, stats_json, sources_json, delay)) = row else {
            return Ok(None);
        };

        Ok(Some(StatisticsRecord {
            timestamp: parse_timestamp(&timestamp)?,
            stats: serde_json::from_str(&stats_json)?,
            sources: serde_json::from_str(&sources_json)?,
            delay_between_requests: delay,
        }))
    }
}
