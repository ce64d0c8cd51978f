//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use recrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Refresh interval: {} days", config.logic.refresh_interval_days);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerIdentityConfig, DbConfig, LoggingConfig, LogicConfig, RobotsTxtConfig,
    SourceConfig, SourceKind, DEFAULT_CRAWLER_ID,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
