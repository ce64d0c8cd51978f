//! Age-based recrawl policy

use crate::storage::CrawlDocument;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Age of a document in fractional days
pub fn age_days(document: &CrawlDocument, now: i64) -> f64 {
    (now - document.crawl_timestamp) as f64 / SECONDS_PER_DAY
}

/// Decides whether a URL should be fetched again
///
/// A URL never seen before is always due. A stored document is due once
/// it is strictly older than `refresh_interval_days`.
pub fn is_due(existing: Option<&CrawlDocument>, now: i64, refresh_interval_days: u32) -> bool {
    match existing {
        None => true,
        Some(document) => age_days(document, now) > f64::from(refresh_interval_days),
    }
}
