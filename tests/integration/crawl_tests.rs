//! Integration tests for full crawl runs
//!
//! These tests drive `run_once` against a scripted onion network and a real
//! SQLite page store in a temporary directory.

use async_trait::async_trait;
use onion_archive::config::{CrawlerConfig, IdentityConfig, StorageConfig};
use onion_archive::crawler::{
    run_once, Coordinator, CrawlOutcome, FetchError, FetchResponse, IdentityRotator,
    SessionFactory, Transport,
};
use onion_archive::state::UrlState;
use onion_archive::storage::{PageStore, SqlitePageStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

type Network = HashMap<String, (u16, String)>;

/// A session that answers from a fixed map of URL -> (status, body)
struct ScriptedSession {
    network: Arc<Network>,
}

#[async_trait]
impl Transport for ScriptedSession {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, FetchError> {
        match self.network.get(url) {
            Some((status, body)) => Ok(FetchResponse {
                status: *status,
                final_url: url.to_string(),
                body: body.clone(),
            }),
            None => Err(FetchError::Connect {
                url: url.to_string(),
                message: "host unreachable".to_string(),
            }),
        }
    }
}

struct ScriptedNetwork {
    network: Arc<Network>,
}

impl SessionFactory for ScriptedNetwork {
    type Session = ScriptedSession;

    fn connect(&self) -> Result<ScriptedSession, FetchError> {
        Ok(ScriptedSession {
            network: Arc::clone(&self.network),
        })
    }
}

fn onion(c: char) -> String {
    format!("http://{}.onion", c.to_string().repeat(56))
}

fn crawler_config(max_pages: u64) -> CrawlerConfig {
    CrawlerConfig {
        max_pages,
        politeness_delay_ms: 0,
        fetch_timeout_secs: 1,
        cycle_interval_secs: 0,
    }
}

fn storage_config(dir: &TempDir, checkpoint_every: u64) -> StorageConfig {
    StorageConfig {
        database_path: dir.path().join("onions.db"),
        backup_dir: dir.path().join("backups"),
        checkpoint_every,
        keep_backups: 3,
        cache_size: 2000,
        busy_timeout_ms: 1000,
    }
}

fn rotator(network: Network) -> IdentityRotator<ScriptedNetwork> {
    let factory = ScriptedNetwork {
        network: Arc::new(network),
    };
    let identity = IdentityConfig {
        rotate_every: 2,
        settle_delay_ms: 0,
    };
    IdentityRotator::new(factory, &identity).unwrap()
}

#[tokio::test]
async fn test_abc_scenario_persists_two_pages() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = SqlitePageStore::open(&storage_config(&temp_dir, 10)).unwrap();
    let mut rotator = rotator(HashMap::from([
        (
            onion('a'),
            (
                200,
                format!(
                    r#"<html><body><a href="{}/">B</a> <a href="{}/">C</a></body></html>"#,
                    onion('b'),
                    onion('c')
                ),
            ),
        ),
        (onion('b'), (404, "Not Found".to_string())),
        (onion('c'), (200, "<html>leaf</html>".to_string())),
    ]));

    let config = crawler_config(3);
    let mut coordinator = Coordinator::new(&config, [onion('a')], &mut rotator, &mut store);
    let summary = coordinator.run().await;

    let frontier = coordinator.frontier();
    let mut visited: Vec<&str> = frontier.visited().collect();
    visited.sort();
    let offline: Vec<&str> = frontier.offline().collect();

    assert_eq!(visited, vec![onion('a').as_str(), onion('c').as_str()]);
    assert_eq!(offline, vec![onion('b').as_str()]);
    assert_eq!(frontier.pending_len(), 0);
    assert_eq!(frontier.state_of(&onion('b')), Some(UrlState::Offline));
    assert_eq!(summary.attempts, 3);
    assert_eq!(summary.outcome, CrawlOutcome::Exhausted);
    drop(coordinator);

    assert_eq!(store.count_pages().unwrap(), 2);
    assert!(store.get_page(&onion('a')).unwrap().is_some());
    assert!(store.get_page(&onion('b')).unwrap().is_none());
    assert_eq!(
        store.get_page(&onion('c')).unwrap().unwrap().content,
        "<html>leaf</html>"
    );
}

#[tokio::test]
async fn test_crawl_checkpoints_while_archiving() {
    let temp_dir = TempDir::new().unwrap();
    let config = storage_config(&temp_dir, 2);
    let mut store = SqlitePageStore::open(&config).unwrap();

    // A chain a -> b -> c -> d -> e, every page online
    let chain = ['a', 'b', 'c', 'd', 'e'];
    let network: Network = chain
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let body = chain
                .get(i + 1)
                .map(|&next| format!("next: {}", onion(next)))
                .unwrap_or_default();
            (onion(c), (200, body))
        })
        .collect();
    let mut rotator = rotator(network);

    let summary = run_once(&crawler_config(100), [onion('a')], &mut rotator, &mut store).await;

    assert_eq!(summary.saved, 5);
    assert_eq!(summary.rotations, 2);
    // Checkpoints on writes 2 and 4
    assert_eq!(store.backups().list().unwrap().len(), 2);
    assert_eq!(store.stats().total_pages, 5);
}

#[tokio::test]
async fn test_second_run_starts_fresh_but_store_accumulates() {
    let temp_dir = TempDir::new().unwrap();
    let config = storage_config(&temp_dir, 10);
    let network: Network = HashMap::from([
        (onion('a'), (200, onion('b'))),
        (onion('b'), (200, String::new())),
    ]);

    let mut store = SqlitePageStore::open(&config).unwrap();
    let mut rotator = rotator(network);

    let first = run_once(&crawler_config(1), [onion('a')], &mut rotator, &mut store).await;
    assert_eq!(first.outcome, CrawlOutcome::Completed);
    assert_eq!(first.pending, 1);

    // The pending b from the first run is not carried over
    let second = run_once(&crawler_config(10), [onion('a')], &mut rotator, &mut store).await;
    assert_eq!(second.outcome, CrawlOutcome::Exhausted);
    assert_eq!(second.attempts, 2);

    store.close();
    let reopened = SqlitePageStore::open(&config).unwrap();
    assert_eq!(reopened.pages_at_open(), 2);
}
