//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full fetch, store and checkpoint cycle end-to-end.

use recrawl::config::{parse_config, Config};
use recrawl::crawler::{crawl, CheckpointManager, Coordinator, StopController};
use recrawl::normalize::content_hash;
use recrawl::state::{CrawlPhase, Stats};
use recrawl::storage::{
    CheckpointRecord, CrawlDocument, SqliteStorage, StatisticsRecord, Storage, StorageError,
    StorageResult, UpsertOutcome,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DAY: i64 = 86_400;

/// Creates a test configuration with a single generic source
fn create_test_config(urls: &[String], respect_robots: bool, retry_attempts: u32) -> Config {
    create_test_config_at(urls, respect_robots, retry_attempts, ":memory:")
}

fn create_test_config_at(
    urls: &[String],
    respect_robots: bool,
    retry_attempts: u32,
    db_path: &str,
) -> Config {
    let list = urls
        .iter()
        .map(|u| format!("\"{}\"", u))
        .collect::<Vec<_>>()
        .join(", ");

    parse_config(&format!(
        r#"
[db]
path = "{db_path}"
collection = "documents"

[logic]
retry-attempts = {retry_attempts}
timeout-seconds = 5
refresh-interval-days = 7
max-documents-per-source = 100
delay-between-requests = 0.0
retry-backoff-seconds = 0.0

[robots-txt]
respect-robots-txt = {respect_robots}
user-agent = "MusicCrawlerBot/1.0"

[sources.local]
source-name = "Local"
urls = [{list}]
"#
    ))
    .expect("test config is valid")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn memory_storage() -> SqliteStorage {
    SqliteStorage::new_in_memory("documents").expect("in-memory store opens")
}

/// Runs one crawl over `storage` and hands the storage back
async fn run_once<S: Storage>(config: &Config, storage: S) -> (recrawl::CrawlReport, S) {
    let mut coordinator =
        Coordinator::new(config.clone(), storage, StopController::new()).unwrap();
    let report = coordinator.run().await.unwrap();
    (report, coordinator.into_storage())
}

/// Pushes the stored copy of `url` back in time and forgets the checkpoint,
/// so the next run fetches it again
fn age_document(storage: &mut SqliteStorage, url: &str, days: i64) {
    let mut document = storage.get_document(url).unwrap().unwrap();
    document.crawl_timestamp -= days * DAY;
    assert_eq!(
        storage.upsert_document(&document).unwrap(),
        UpsertOutcome::Unchanged
    );
    storage.clear_checkpoint("music_crawler").unwrap();
}

#[tokio::test]
async fn test_first_fetch_stores_new_document() {
    let server = MockServer::start().await;
    let body = "<html><head><title>Yesterday</title></head><body>...</body></html>";
    Mock::given(method("GET"))
        .and(path("/song/1"))
        .respond_with(html(body))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/song/1", server.uri());
    let config = create_test_config(&[url.clone()], false, 3);
    let (report, storage) = run_once(&config, memory_storage()).await;

    assert_eq!(report.phase, CrawlPhase::Finished);
    assert!(!report.stopped);
    assert_eq!(report.stats.total_crawled, 1);
    assert_eq!(report.stats.new_documents, 1);
    assert_eq!(report.stats.failed_documents, 0);

    let document = storage.get_document(&url).unwrap().unwrap();
    assert_eq!(document.title, "Yesterday");
    assert_eq!(document.content_hash, content_hash(body));
    assert_eq!(document.source, "Local");
    assert_eq!(document.response_code, 200);
    assert!(document.previous_versions.is_empty());

    let checkpoint = storage.load_checkpoint("music_crawler").unwrap().unwrap();
    assert_eq!(checkpoint.last_url, url);
    assert_eq!(checkpoint.stats.total_crawled, 1);

    let statistics = storage.latest_statistics().unwrap().unwrap();
    assert_eq!(statistics.stats.new_documents, 1);
    assert_eq!(statistics.sources, vec!["local".to_string()]);
}

#[tokio::test]
async fn test_persistent_503_is_retried_then_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let url = format!("{}/busy", server.uri());
    let config = create_test_config(&[url.clone()], false, 3);
    let (report, storage) = run_once(&config, memory_storage()).await;

    assert_eq!(report.stats.failed_documents, 1);
    assert_eq!(report.stats.total_crawled, 0);
    assert!(storage.get_document(&url).unwrap().is_none());
    assert!(storage.load_checkpoint("music_crawler").unwrap().is_none());
}

#[tokio::test]
async fn test_robots_gate_blocks_private_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/page.html"))
        .respond_with(html("<title>Public</title>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/page.html"))
        .respond_with(html("<title>Private</title>"))
        .expect(0)
        .mount(&server)
        .await;

    let public = format!("{}/public/page.html", server.uri());
    let private = format!("{}/private/page.html", server.uri());
    let config = create_test_config(&[private.clone(), public.clone()], true, 3);
    let (report, storage) = run_once(&config, memory_storage()).await;

    assert_eq!(report.processed, 2);
    assert_eq!(report.stats.total_crawled, 1);
    // A politeness denial is neither a success nor a failure
    assert_eq!(report.stats.failed_documents, 0);
    assert_eq!(report.stats.skipped_documents, 0);
    assert!(storage.get_document(&public).unwrap().is_some());
    assert!(storage.get_document(&private).unwrap().is_none());
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/page.html"))
        .respond_with(html("<title>Private</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/private/page.html", server.uri());
    let config = create_test_config(&[url], false, 3);
    let (report, _) = run_once(&config, memory_storage()).await;
    assert_eq!(report.stats.total_crawled, 1);
}

#[tokio::test]
async fn test_resume_continues_after_checkpoint() {
    let server = MockServer::start().await;
    for (name, expected) in [("/u1", 0), ("/u2", 0), ("/u3", 1)] {
        Mock::given(method("GET"))
            .and(path(name))
            .respond_with(html(&format!("<title>{}</title>", name)))
            .expect(expected)
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawler.db");
    let urls: Vec<String> = ["/u1", "/u2", "/u3"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    let config = create_test_config_at(&urls, false, 3, db_path.to_str().unwrap());

    {
        let mut storage = SqliteStorage::new(&db_path, "documents").unwrap();
        CheckpointManager::new("music_crawler")
            .save(&mut storage, &urls[1], &Stats::new())
            .unwrap();
    }

    let report = crawl(config, StopController::new()).await.unwrap();
    assert_eq!(report.resumed_at, 2);
    assert_eq!(report.processed, 1);
    assert_eq!(report.stats.new_documents, 1);

    let storage = SqliteStorage::new(&db_path, "documents").unwrap();
    assert_eq!(storage.count_documents().unwrap(), 1);
    assert!(storage.get_document(&urls[2]).unwrap().is_some());
    assert_eq!(
        storage.load_checkpoint("music_crawler").unwrap().unwrap().last_url,
        urls[2]
    );
}

#[tokio::test]
async fn test_unknown_checkpoint_url_starts_from_beginning() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<title>Any</title>"))
        .expect(2)
        .mount(&server)
        .await;

    let urls = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];
    let config = create_test_config(&urls, false, 3);

    let mut storage = memory_storage();
    storage
        .save_checkpoint("music_crawler", "https://gone.example/x", &Stats::new())
        .unwrap();

    let (report, _) = run_once(&config, storage).await;
    assert_eq!(report.resumed_at, 0);
    assert_eq!(report.stats.total_crawled, 2);
}

#[tokio::test]
async fn test_recent_document_is_skipped_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song"))
        .respond_with(html("<title>Song</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/song", server.uri());
    let config = create_test_config(&[url.clone()], false, 3);

    let (_, mut storage) = run_once(&config, memory_storage()).await;
    storage.clear_checkpoint("music_crawler").unwrap();

    let (report, storage) = run_once(&config, storage).await;
    assert_eq!(report.stats.skipped_documents, 1);
    assert_eq!(report.stats.total_crawled, 0);
    assert_eq!(storage.count_documents().unwrap(), 1);
}

#[tokio::test]
async fn test_change_inside_refresh_window_waits_for_staleness() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song"))
        .respond_with(html("<title>First</title>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/song"))
        .respond_with(html("<title>Second</title>"))
        .mount(&server)
        .await;

    let url = format!("{}/song", server.uri());
    let config = create_test_config(&[url.clone()], false, 3);

    let (first, mut storage) = run_once(&config, memory_storage()).await;
    assert_eq!(first.stats.new_documents, 1);
    storage.clear_checkpoint("music_crawler").unwrap();

    // Origin now serves "Second", but the stored copy is still fresh
    let (inside, mut storage) = run_once(&config, storage).await;
    assert_eq!(inside.stats.skipped_documents, 1);
    assert_eq!(inside.stats.total_crawled, 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(
        storage.get_document(&url).unwrap().unwrap().content_hash,
        content_hash("<title>First</title>")
    );

    age_document(&mut storage, &url, 8);
    let (stale, storage) = run_once(&config, storage).await;
    assert_eq!(stale.stats.updated_documents, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);

    let document = storage.get_document(&url).unwrap().unwrap();
    assert_eq!(document.content_hash, content_hash("<title>Second</title>"));
    assert_eq!(document.previous_versions.len(), 1);
    assert_eq!(
        document.previous_versions[0].content_hash,
        content_hash("<title>First</title>")
    );
}

#[tokio::test]
async fn test_refetch_of_identical_content_is_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song"))
        .respond_with(html("<title>Song</title><p>X</p>"))
        .expect(2)
        .mount(&server)
        .await;

    let url = format!("{}/song", server.uri());
    let config = create_test_config(&[url.clone()], false, 3);

    let (_, mut storage) = run_once(&config, memory_storage()).await;
    let before = storage.get_document(&url).unwrap().unwrap();
    age_document(&mut storage, &url, 8);

    let (report, storage) = run_once(&config, storage).await;
    assert_eq!(report.stats.total_crawled, 1);
    assert_eq!(report.stats.new_documents, 0);
    assert_eq!(report.stats.updated_documents, 0);
    assert_eq!(report.stats.skipped_documents, 1);

    let after = storage.get_document(&url).unwrap().unwrap();
    assert_eq!(after.content_hash, before.content_hash);
    assert!(after.crawl_timestamp >= before.crawl_timestamp);
    assert!(after.previous_versions.is_empty());
}

#[tokio::test]
async fn test_changed_content_is_versioned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song"))
        .respond_with(html("<title>First</title>"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/song"))
        .respond_with(html("<title>Second</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/song", server.uri());
    let config = create_test_config(&[url.clone()], false, 3);

    let (first, mut storage) = run_once(&config, memory_storage()).await;
    assert_eq!(first.stats.new_documents, 1);
    age_document(&mut storage, &url, 30);
    let aged = storage.get_document(&url).unwrap().unwrap();

    let (second, storage) = run_once(&config, storage).await;
    assert_eq!(second.stats.updated_documents, 1);

    let document = storage.get_document(&url).unwrap().unwrap();
    assert_eq!(document.title, "Second");
    assert_eq!(document.content_hash, content_hash("<title>Second</title>"));
    assert_eq!(document.previous_versions.len(), 1);
    assert_eq!(
        document.previous_versions[0].content_hash,
        content_hash("<title>First</title>")
    );
    assert_eq!(document.previous_versions[0].title, "First");
    assert_eq!(
        document.previous_versions[0].crawl_timestamp,
        aged.crawl_timestamp
    );
}

#[tokio::test]
async fn test_non_html_content_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lyrics.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"lyrics": "..."}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/lyrics.json", server.uri());
    let config = create_test_config(&[url.clone()], false, 3);
    let (report, storage) = run_once(&config, memory_storage()).await;

    assert_eq!(report.stats.failed_documents, 1);
    assert!(storage.get_document(&url).unwrap().is_none());
}

#[tokio::test]
async fn test_stop_flag_prevents_further_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<title>Any</title>"))
        .expect(0)
        .mount(&server)
        .await;

    let urls = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];
    let config = create_test_config(&urls, false, 3);

    let stop = StopController::new();
    stop.stop();
    let mut coordinator = Coordinator::new(config, memory_storage(), stop).unwrap();
    let report = coordinator.run().await.unwrap();

    assert!(report.stopped);
    assert_eq!(report.phase, CrawlPhase::Finished);
    assert_eq!(report.processed, 0);
    assert!(coordinator.storage().latest_statistics().unwrap().is_some());
}

/// Store that refuses to persist one URL
struct FailingStore {
    inner: SqliteStorage,
    fail_url: String,
}

impl Storage for FailingStore {
    fn create_indexes(&mut self) -> StorageResult<()> {
        self.inner.create_indexes()
    }

    fn get_document(&self, url: &str) -> StorageResult<Option<CrawlDocument>> {
        self.inner.get_document(url)
    }

    fn upsert_document(&mut self, document: &CrawlDocument) -> StorageResult<UpsertOutcome> {
        if document.url == self.fail_url {
            return Err(StorageError::Database("disk full".to_string()));
        }
        self.inner.upsert_document(document)
    }

    fn documents_by_source(
        &self,
        source: &str,
        limit: usize,
    ) -> StorageResult<Vec<CrawlDocument>> {
        self.inner.documents_by_source(source, limit)
    }

    fn documents_by_hash(&self, content_hash: &str) -> StorageResult<Vec<CrawlDocument>> {
        self.inner.documents_by_hash(content_hash)
    }

    fn duplicate_content_groups(&self) -> StorageResult<Vec<(String, Vec<String>)>> {
        self.inner.duplicate_content_groups()
    }

    fn count_documents(&self) -> StorageResult<u64> {
        self.inner.count_documents()
    }

    fn count_documents_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        self.inner.count_documents_by_source()
    }

    fn save_checkpoint(
        &mut self,
        crawler_id: &str,
        last_url: &str,
        stats: &Stats,
    ) -> StorageResult<()> {
        assert_ne!(last_url, self.fail_url, "checkpoint advanced past a failed store");
        self.inner.save_checkpoint(crawler_id, last_url, stats)
    }

    fn load_checkpoint(&self, crawler_id: &str) -> StorageResult<Option<CheckpointRecord>> {
        self.inner.load_checkpoint(crawler_id)
    }

    fn clear_checkpoint(&mut self, crawler_id: &str) -> StorageResult<()> {
        self.inner.clear_checkpoint(crawler_id)
    }

    fn insert_statistics(&mut self, record: &StatisticsRecord) -> StorageResult<i64> {
        self.inner.insert_statistics(record)
    }

    fn latest_statistics(&self) -> StorageResult<Option<StatisticsRecord>> {
        self.inner.latest_statistics()
    }
}

#[tokio::test]
async fn test_store_failure_is_isolated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<title>Any</title>"))
        .expect(3)
        .mount(&server)
        .await;

    let urls: Vec<String> = ["/a", "/bad", "/c"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    let config = create_test_config(&urls, false, 3);
    let store = FailingStore {
        inner: memory_storage(),
        fail_url: urls[1].clone(),
    };

    let (report, store) = run_once(&config, store).await;

    assert_eq!(report.stats.failed_documents, 1);
    assert_eq!(report.stats.total_crawled, 2);
    assert_eq!(store.count_documents().unwrap(), 2);
    assert_eq!(
        store.load_checkpoint("music_crawler").unwrap().unwrap().last_url,
        urls[2]
    );
}
