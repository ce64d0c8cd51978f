use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Checkpoint identity used when the configuration does not name one
pub const DEFAULT_CRAWLER_ID: &str = "music_crawler";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db: DbConfig,
    pub logic: LogicConfig,
    #[serde(rename = "robots-txt")]
    pub robots_txt: RobotsTxtConfig,
    #[serde(default)]
    pub crawler: CrawlerIdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Sources keyed by their configuration name, iterated in key order
    pub sources: BTreeMap<String, SourceConfig>,
}

impl Config {
    /// Returns the enabled sources in iteration order
    pub fn enabled_sources(&self) -> impl Iterator<Item = (&String, &SourceConfig)> {
        self.sources.iter().filter(|(_, source)| source.enabled)
    }
}

/// Datastore configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    /// Path to the SQLite database file
    pub path: String,

    /// Name of the documents table
    pub collection: String,
}

/// Crawl logic parameters
#[derive(Debug, Clone, Deserialize)]
pub struct LogicConfig {
    /// Total fetch attempts per URL, including the first one
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Minimum document age (days) before it is fetched again
    #[serde(rename = "refresh-interval-days")]
    pub refresh_interval_days: u32,

    /// Cap on the number of URLs taken from each source
    #[serde(rename = "max-documents-per-source")]
    pub max_documents_per_source: usize,

    /// Pause between consecutive requests (seconds)
    #[serde(rename = "delay-between-requests")]
    pub delay_between_requests: f64,

    /// Base of the exponential backoff between attempts (seconds)
    #[serde(rename = "retry-backoff-seconds", default = "default_backoff")]
    pub retry_backoff_seconds: f64,

    /// Emit an intermediate statistics block every this many documents
    #[serde(rename = "stats-interval", default = "default_stats_interval")]
    pub stats_interval: u64,
}

impl LogicConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_between_requests)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.retry_backoff_seconds)
    }
}

fn default_backoff() -> f64 {
    1.0
}

fn default_stats_interval() -> u64 {
    10
}

/// Politeness configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RobotsTxtConfig {
    /// Whether to consult robots.txt before each fetch
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,

    /// User-Agent header sent with every request, also matched against robots.txt groups
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

/// Identity of this crawler instance for checkpointing
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerIdentityConfig {
    #[serde(default = "default_crawler_id")]
    pub id: String,
}

impl Default for CrawlerIdentityConfig {
    fn default() -> Self {
        Self {
            id: default_crawler_id(),
        }
    }
}

fn default_crawler_id() -> String {
    DEFAULT_CRAWLER_ID.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional file receiving a copy of the log output
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A single document source
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Human-readable source name stored on every document
    #[serde(rename = "source-name")]
    pub source_name: String,

    /// Directory of upstream metadata files used to generate URLs
    #[serde(rename = "metadata-dir", default)]
    pub metadata_dir: Option<String>,

    /// Explicit source family; inferred from the section key when absent
    #[serde(default)]
    pub kind: Option<SourceKind>,

    /// Fixed URL list for generic sources
    #[serde(default)]
    pub urls: Vec<String>,
}

impl SourceConfig {
    /// Resolves the source family, falling back to the configuration key
    pub fn resolved_kind(&self, key: &str) -> SourceKind {
        self.kind.unwrap_or_else(|| SourceKind::from_key(key))
    }
}

fn default_enabled() -> bool {
    true
}

/// Source families with their own URL generation, canonicalization and title rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "lyrics_ovh")]
    LyricsOvh,
    #[serde(rename = "musicbrainz")]
    MusicBrainz,
    #[serde(rename = "generic")]
    Generic,
}

impl SourceKind {
    /// Infers the family from a configuration key such as `lyrics_ovh`
    pub fn from_key(key: &str) -> Self {
        match key.to_lowercase().replace('-', "_").as_str() {
            "lyrics_ovh" | "lyricsovh" => Self::LyricsOvh,
            "musicbrainz" | "music_brainz" => Self::MusicBrainz,
            _ => Self::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LyricsOvh => "lyrics_ovh",
            Self::MusicBrainz => "musicbrainz",
            Self::Generic => "generic",
        }
    }
}
