//! Database schema definitions
//!
//! The documents table takes its name from the configured collection, so
//! its DDL is generated. The collection name is validated as a plain
//! identifier before it reaches this module.

/// SQL schema for the checkpoint and statistics tables
pub const SCHEMA_SQL: &str = r#"
-- One progress marker per crawler identity, overwritten on every save
CREATE TABLE IF NOT EXISTS crawler_checkpoints (
    crawler_id TEXT PRIMARY KEY,
    last_url TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    stats TEXT NOT NULL
);

-- Final statistics of every run, append-only
CREATE TABLE IF NOT EXISTS crawler_statistics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    stats TEXT NOT NULL,
    sources TEXT NOT NULL,
    delay_between_requests REAL NOT NULL
);
"#;

/// Name of the version history table belonging to a collection
pub fn versions_table(collection: &str) -> String {
    format!("{}_versions", collection)
}

/// DDL for a documents collection and its version history
pub fn documents_schema(collection: &str) -> String {
    let versions = versions_table(collection);
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {collection} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    original_url TEXT NOT NULL,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    title TEXT NOT NULL,
    source TEXT NOT NULL,
    crawl_timestamp INTEGER NOT NULL,
    response_code INTEGER NOT NULL,
    content_length INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    last_modified TEXT
);

-- Superseded versions; position orders them oldest first per URL
CREATE TABLE IF NOT EXISTS {versions} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL REFERENCES {collection}(url),
    position INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    crawl_timestamp INTEGER NOT NULL,
    title TEXT NOT NULL,
    UNIQUE(url, position)
);
"#
    )
}

/// DDL for the secondary access paths of a collection
pub fn index_schema(collection: &str) -> String {
    let versions = versions_table(collection);
    format!(
        r#"
CREATE INDEX IF NOT EXISTS idx_{collection}_source_time
    ON {collection}(source, crawl_timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_{collection}_content_hash
    ON {collection}(content_hash);
CREATE INDEX IF NOT EXISTS idx_{versions}_url
    ON {versions}(url);
"#
    )
}

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `collection` - Name of the documents table
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(
    conn: &rusqlite::Connection,
    collection: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&documents_schema(collection))?;
    Ok(())
}

/// Creates the secondary indexes of a collection
pub fn create_indexes(
    conn: &rusqlite::Connection,
    collection: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&index_schema(collection))
}
