//! Work queue construction

use crate::config::{Config, SourceKind};
use crate::sources;

/// One URL to process, tagged with its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    /// Display name of the source (`source-name`)
    pub source_name: String,
    pub kind: SourceKind,
}

/// Builds the work queue for a run
///
/// Enabled sources are visited in key order. Each contributes at most
/// `max_documents_per_source` URLs, in the order its generator yields them.
pub fn build_work_queue(config: &Config) -> Vec<WorkItem> {
    let mut queue = Vec::new();

    for (key, source) in config.enabled_sources() {
        let kind = source.resolved_kind(key);
        let urls = sources::generate_urls(key, source);
        let before = queue.len();

        queue.extend(
            urls.into_iter()
                .take(config.logic.max_documents_per_source)
                .map(|url| WorkItem {
                    url,
                    source_name: source.source_name.clone(),
                    kind,
                }),
        );

        tracing::info!(
            "Source {} ({}): {} URLs queued",
            key,
            kind.as_str(),
            queue.len() - before
        );
    }

    queue
}
