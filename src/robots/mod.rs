//! Robots.txt handling module
//!
//! This module provides functionality for fetching, scanning, and caching
//! robots.txt files. Fetching is best effort: anything other than a
//! readable 200 response allows the crawl.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::RobotsRules;

use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Timeout for robots.txt requests, independent of the page timeout
pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);

/// Origin key (`scheme://host[:port]`) used for caching
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Location of the robots.txt governing a URL
///
/// Returns None for URLs without a host.
pub fn robots_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
        None => format!("{}://{}/robots.txt", url.scheme(), host),
    })
}

/// Fetches and scans robots.txt
///
/// # Arguments
///
/// * `client` - The HTTP client (carries the configured user agent)
/// * `robots_url` - Full robots.txt URL
///
/// # Returns
///
/// The scanned rules, or allow-all rules on timeout, transport failure,
/// non-200 status, or an unreadable body.
pub async fn fetch_robots(client: &Client, robots_url: &str) -> RobotsRules {
    let response = match client.get(robots_url).timeout(ROBOTS_TIMEOUT).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt unavailable at {}: {}", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    if response.status() != StatusCode::OK {
        tracing::debug!(
            "robots.txt at {} returned {}, allowing",
            robots_url,
            response.status()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => RobotsRules::parse(&body),
        Err(e) => {
            tracing::debug!("Failed to read robots.txt at {}: {}", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}
