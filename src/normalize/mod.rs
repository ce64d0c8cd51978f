//! Content normalization
//!
//! Turns a fetched page into a [`CrawlDocument`]: the URL is reduced to its
//! canonical form, the body is hashed, and a title is scanned out of the
//! markup. Nothing here parses HTML; titles come from plain substring
//! scanning.

mod canonical;
mod hash;
mod title;

pub use self::canonical::canonical_url;
pub use self::hash::content_hash;
pub use self::title::{extract_title, placeholder_title};

use crate::config::SourceKind;
use crate::crawler::FetchedPage;
use crate::storage::CrawlDocument;

/// Builds the document stored for a fetched work item
///
/// # Arguments
///
/// * `raw_url` - URL as it appeared in the work queue
/// * `source_name` - Display name of the source the item came from
/// * `kind` - Source kind, selects canonicalization and title fallbacks
/// * `page` - The fetched response
/// * `crawl_timestamp` - Fetch time in seconds since the Unix epoch
pub fn derive_document(
    raw_url: &str,
    source_name: &str,
    kind: SourceKind,
    page: &FetchedPage,
    crawl_timestamp: i64,
) -> CrawlDocument {
    CrawlDocument {
        url: canonical_url(raw_url, kind),
        original_url: raw_url.to_string(),
        content: page.body.clone(),
        content_hash: content_hash(&page.body),
        title: extract_title(&page.body, kind, source_name),
        source: source_name.to_string(),
        crawl_timestamp,
        response_code: page.status,
        content_length: page.body.len() as u64,
        content_type: page.content_type.clone(),
        last_modified: page.last_modified.clone(),
        previous_versions: Vec::new(),
    }
}
