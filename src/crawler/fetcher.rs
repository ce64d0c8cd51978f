//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients with the configured user agent
//! - The robots.txt politeness gate
//! - Retry with exponential backoff for transient failures
//! - Error classification

use crate::config::{LogicConfig, RobotsTxtConfig};
use crate::robots::{self, RobotsCache};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, LAST_MODIFIED,
};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Statuses worth another attempt
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Why a URL could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("content is not HTML: {content_type}")]
    NonHtmlContent { content_type: String },

    #[error("disallowed by robots.txt")]
    PolitenessDenied,
}

impl FetchError {
    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::HttpStatus { status } => RETRYABLE_STATUSES.contains(status),
            Self::NonHtmlContent { .. } | Self::PolitenessDenied => false,
        }
    }

    /// Politeness denials are not failures of the crawl
    pub fn counts_as_failure(&self) -> bool {
        !matches!(self, Self::PolitenessDenied)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// A successful HTML response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: String,
    pub last_modified: Option<String>,
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
/// * `timeout` - Whole-request timeout for page fetches
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Delay before attempt `attempt + 1`: `base * 2^(attempt - 1)`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exponent)
}

/// Page fetcher with retry and robots.txt handling
pub struct Fetcher {
    client: Client,
    user_agent: String,
    respect_robots: bool,
    retry_attempts: u32,
    backoff_base: Duration,
    robots: RobotsCache,
}

impl Fetcher {
    /// Creates a fetcher from the crawl and politeness settings
    pub fn new(
        logic: &LogicConfig,
        robots_config: &RobotsTxtConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&robots_config.user_agent, logic.timeout())?;
        Ok(Self::with_client(client, logic, robots_config))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(
        client: Client,
        logic: &LogicConfig,
        robots_config: &RobotsTxtConfig,
    ) -> Self {
        Self {
            client,
            user_agent: robots_config.user_agent.clone(),
            respect_robots: robots_config.respect_robots_txt,
            retry_attempts: logic.retry_attempts.max(1),
            backoff_base: logic.backoff_base(),
            robots: RobotsCache::new(),
        }
    }

    /// Fetches a URL
    ///
    /// # Request Flow
    ///
    /// 1. Politeness gate (when enabled): robots.txt of the origin is
    ///    fetched once and cached
    /// 2. Up to `retry_attempts` GET attempts; timeouts, transport failures
    ///    and statuses in [`RETRYABLE_STATUSES`] are retried after
    ///    [`backoff_delay`]
    /// 3. Any other non-2xx status, or a 2xx response that is not
    ///    `text/html`, ends the fetch
    pub async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed =
            Url::parse(url).map_err(|e| FetchError::Transport(format!("invalid URL: {}", e)))?;

        if self.respect_robots && !self.is_allowed(&parsed).await {
            return Err(FetchError::PolitenessDenied);
        }

        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    let delay = backoff_delay(self.backoff_base, attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        self.retry_attempts,
                        url,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Checks the politeness gate for a URL
    pub async fn is_allowed(&mut self, url: &Url) -> bool {
        let origin = robots::origin_key(url);

        if self.robots.get(&origin).is_none() {
            let rules = match robots::robots_url(url) {
                Some(robots_url) => robots::fetch_robots(&self.client, &robots_url).await,
                None => robots::RobotsRules::allow_all(),
            };
            tracing::debug!("Cached robots.txt for {} ({} blocks)", origin, rules.block_count());
            self.robots.insert(origin.clone(), rules);
        }

        self.robots
            .get(&origin)
            .map(|rules| rules.is_allowed(url.path(), &self.user_agent))
            .unwrap_or(true)
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_type = header_string(response.headers(), CONTENT_TYPE).unwrap_or_default();
        if !content_type.contains("text/html") {
            return Err(FetchError::NonHtmlContent { content_type });
        }

        let last_modified = header_string(response.headers(), LAST_MODIFIED);
        let body = response.text().await?;

        Ok(FetchedPage {
            status: status.as_u16(),
            content_type,
            last_modified,
            body,
        })
    }
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("user_agent", &self.user_agent)
            .field("respect_robots", &self.respect_robots)
            .field("retry_attempts", &self.retry_attempts)
            .field("backoff_base", &self.backoff_base)
            .finish()
    }
}
