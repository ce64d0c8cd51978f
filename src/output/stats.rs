//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::{CheckpointRecord, StatisticsRecord, Storage};
use crate::CrawlerError;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Number of documents in the collection
    pub total_documents: u64,

    /// Document counts per source, ordered by source name
    pub documents_by_source: Vec<(String, u64)>,

    /// Content hashes shared by several URLs
    pub duplicate_groups: Vec<(String, Vec<String>)>,

    /// Current checkpoint of the crawler identity
    pub checkpoint: Option<CheckpointRecord>,

    /// Statistics of the most recent run
    pub last_run: Option<StatisticsRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `crawler_id` - Identity whose checkpoint is reported
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(CrawlerError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn Storage,
    crawler_id: &str,
) -> Result<StoreStatistics, CrawlerError> {
    Ok(StoreStatistics {
        total_documents: storage.count_documents()?,
        documents_by_source: storage.count_documents_by_source()?,
        duplicate_groups: storage.duplicate_content_groups()?,
        checkpoint: storage.load_checkpoint(crawler_id)?,
        last_run: storage.latest_statistics()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Documents: {}", stats.total_documents);
    for (source, count) in &stats.documents_by_source {
        let percentage = if stats.total_documents > 0 {
            (*count as f64 / stats.total_documents as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", source, count, percentage);
    }
    println!();

    if !stats.duplicate_groups.is_empty() {
        println!("Duplicate Content ({} groups):", stats.duplicate_groups.len());
        for (hash, urls) in &stats.duplicate_groups {
            println!("  {} ({} URLs)", &hash[..hash.len().min(12)], urls.len());
            for url in urls {
                println!("    - {}", url);
            }
        }
        println!();
    }

    match &stats.checkpoint {
        Some(checkpoint) => {
            println!("Checkpoint ({}):", checkpoint.crawler_id);
            println!("  Last URL: {}", checkpoint.last_url);
            println!("  Saved at: {}", checkpoint.timestamp.to_rfc3339());
        }
        None => println!("Checkpoint: none"),
    }
    println!();

    match &stats.last_run {
        Some(run) => {
            println!("Last Run ({}):", run.timestamp.to_rfc3339());
            println!("  Sources: {}", run.sources.join(", "));
            println!("  Delay between requests: {}s", run.delay_between_requests);
            for line in run.stats.summary_block(run.timestamp).lines().skip(1) {
                println!("{}", line);
            }
        }
        None => println!("Last Run: none recorded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::content_hash;
    use crate::state::Stats;
    use crate::storage::{CrawlDocument, SqliteStorage};
    use chrono::Utc;

    fn document(url: &str, source: &str, content: &str) -> CrawlDocument {
        CrawlDocument {
            url: url.to_string(),
            original_url: url.to_string(),
            content: content.to_string(),
            content_hash: content_hash(content),
            title: "T".to_string(),
            source: source.to_string(),
            crawl_timestamp: 1,
            response_code: 200,
            content_length: content.len() as u64,
            content_type: "text/html".to_string(),
            last_modified: None,
            previous_versions: vec![],
        }
    }

    #[test]
    fn test_empty_store() {
        let storage = SqliteStorage::new_in_memory("documents").unwrap();
        let stats = load_statistics(&storage, "music_crawler").unwrap();

        assert_eq!(stats.total_documents, 0);
        assert!(stats.documents_by_source.is_empty());
        assert!(stats.checkpoint.is_none());
        assert!(stats.last_run.is_none());
        print_statistics(&stats);
    }

    #[test]
    fn test_populated_store() {
        let mut storage = SqliteStorage::new_in_memory("documents").unwrap();
        storage.upsert_document(&document("https://a.example/1", "A", "x")).unwrap();
        storage.upsert_document(&document("https://a.example/2", "A", "x")).unwrap();
        storage.upsert_document(&document("https://b.example/1", "B", "y")).unwrap();
        storage.save_checkpoint("music_crawler", "https://b.example/1", &Stats::new()).unwrap();
        storage
            .insert_statistics(&StatisticsRecord {
                timestamp: Utc::now(),
                stats: Stats::new(),
                sources: vec!["a".to_string(), "b".to_string()],
                delay_between_requests: 1.5,
            })
            .unwrap();

        let stats = load_statistics(&storage, "music_crawler").unwrap();
        assert_eq!(stats.total_documents, 3);
        assert_eq!(
            stats.documents_by_source,
            vec![("A".to_string(), 2), ("B".to_string(), 1)]
        );
        assert_eq!(stats.duplicate_groups.len(), 1);
        assert_eq!(stats.checkpoint.as_ref().unwrap().last_url, "https://b.example/1");
        assert_eq!(stats.last_run.as_ref().unwrap().sources.len(), 2);
        print_statistics(&stats);
    }
}
