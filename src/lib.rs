//! Recrawl: an incremental, change-aware document crawler
//!
//! This crate fetches documents from a small set of configured sources,
//! detects whether a previously stored document has changed, keeps a
//! version history of superseded content, and checkpoints its progress so
//! an interrupted run can resume without re-downloading unchanged content.

pub mod config;
pub mod crawler;
pub mod normalize;
pub mod output;
pub mod robots;
pub mod sources;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to connect to document store at {path}: {source}")]
    Connection {
        path: String,
        source: rusqlite::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, StopController};
pub use state::{CrawlPhase, Stats};
pub use storage::{CrawlDocument, SqliteStorage, Storage, UpsertOutcome};
