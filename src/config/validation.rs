use crate::config::types::{
    Config, DbConfig, LogicConfig, RobotsTxtConfig, SourceConfig, SourceKind,
};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Tables owned by the crawler besides the documents table
const RESERVED_TABLES: &[&str] = &["crawler_checkpoints", "crawler_statistics"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_db_config(&config.db)?;
    validate_logic_config(&config.logic)?;
    validate_robots_config(&config.robots_txt)?;

    if config.crawler.id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler id cannot be empty".to_string(),
        ));
    }

    validate_sources(config)?;
    Ok(())
}

/// Validates datastore configuration
fn validate_db_config(config: &DbConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation("db path cannot be empty".to_string()));
    }

    validate_collection_name(&config.collection)
}

/// The collection name is interpolated into SQL, so it must be a plain identifier
fn validate_collection_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Validation(format!(
            "collection must be a plain identifier (letters, digits, '_'), got '{}'",
            name
        )));
    }

    if RESERVED_TABLES.contains(&name) || name.starts_with("sqlite_") || name.ends_with("_versions")
    {
        return Err(ConfigError::Validation(format!(
            "collection name '{}' is reserved",
            name
        )));
    }

    Ok(())
}

/// Validates crawl logic parameters
fn validate_logic_config(config: &LogicConfig) -> Result<(), ConfigError> {
    if config.retry_attempts < 1 || config.retry_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be between 1 and 10, got {}",
            config.retry_attempts
        )));
    }

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_seconds must be >= 1, got {}",
            config.timeout_seconds
        )));
    }

    if config.max_documents_per_source < 1 {
        return Err(ConfigError::Validation(format!(
            "max_documents_per_source must be >= 1, got {}",
            config.max_documents_per_source
        )));
    }

    validate_seconds("delay_between_requests", config.delay_between_requests)?;
    validate_seconds("retry_backoff_seconds", config.retry_backoff_seconds)?;

    if config.stats_interval < 1 {
        return Err(ConfigError::Validation(
            "stats_interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Rejects negative, non-finite and out-of-range second counts
fn validate_seconds(name: &str, seconds: f64) -> Result<(), ConfigError> {
    Duration::try_from_secs_f64(seconds).map_err(|e| {
        ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}: {}",
            name, seconds, e
        ))
    })?;
    Ok(())
}

/// Validates politeness configuration
fn validate_robots_config(config: &RobotsTxtConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user_agent contains control characters: {:?}",
            config.user_agent
        )));
    }

    Ok(())
}

/// Validates source entries
fn validate_sources(config: &Config) -> Result<(), ConfigError> {
    if config.enabled_sources().next().is_none() {
        return Err(ConfigError::Validation(
            "at least one source must be enabled".to_string(),
        ));
    }

    for (key, source) in &config.sources {
        validate_source(key, source)?;
    }

    Ok(())
}

fn validate_source(key: &str, source: &SourceConfig) -> Result<(), ConfigError> {
    if source.source_name.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "source '{}' must have a non-empty source-name",
            key
        )));
    }

    if source.enabled && source.resolved_kind(key) == SourceKind::Generic && source.urls.is_empty()
    {
        return Err(ConfigError::Validation(format!(
            "generic source '{}' must list at least one URL",
            key
        )));
    }

    for raw in &source.urls {
        let url = Url::parse(raw).map_err(|e| {
            ConfigError::Validation(format!("Invalid URL '{}' in source '{}': {}", raw, key, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "URL '{}' in source '{}' must use http or https",
                raw, key
            )));
        }
    }

    Ok(())
}
