//! End-to-end pipeline tests against a local HTTP fixture.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use datum_core::{
    CacheLayout, ClientSettings, OutputMode, PullError, PullRequest, Reporter, pull, scan_updates,
};
use datum_registry::{DataPackage, PublisherInfo, Registry, Source};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// HTTP fixture
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Route {
    Body(Vec<u8>),
    Error(u16),
}

struct TestServer {
    base: String,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(routes: HashMap<String, Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let routes = Arc::new(routes);

        let hits_inner = Arc::clone(&hits);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&hits_inner);
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut head = Vec::new();
                    loop {
                        let Ok(n) = stream.read(&mut buf).await else {
                            return;
                        };
                        if n == 0 {
                            break;
                        }
                        head.extend_from_slice(&buf[..n]);
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    let request = String::from_utf8_lossy(&head);
                    let path = request
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();

                    hits.fetch_add(1, Ordering::SeqCst);

                    let response = match routes.get(&path) {
                        Some(Route::Body(body)) => {
                            let mut resp = format!(
                                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                                body.len()
                            )
                            .into_bytes();
                            resp.extend_from_slice(body);
                            resp
                        }
                        Some(Route::Error(status)) => format!(
                            "HTTP/1.1 {status} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        )
                        .into_bytes(),
                        None => b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_vec(),
                    };
                    let _ = stream.write_all(&response).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        TestServer {
            base: format!("http://{addr}"),
            hits,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CONTENT: &[u8] = b"col1,col2\n1,2\n3,4\n";

fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(data))
}

fn package(id: &str, version: &str, sources: Vec<Source>) -> DataPackage {
    DataPackage {
        id: id.to_string(),
        version: version.to_string(),
        title: "Sample Data".to_string(),
        description: None,
        license: None,
        publisher: PublisherInfo {
            name: "Sample Publisher".to_string(),
            url: None,
        },
        sources,
        tags: None,
        created: None,
        updated: None,
    }
}

fn source(url: String, checksum: Option<String>) -> Source {
    Source {
        url,
        format: "csv".to_string(),
        size: None,
        checksum,
    }
}

fn reporter() -> Reporter {
    Reporter::new(OutputMode::Plain, true)
}

async fn run_pull(
    pkg: &DataPackage,
    cache: &CacheLayout,
    dest: &Path,
    force: bool,
    parallelism: usize,
) -> Result<datum_core::PullOutcome, PullError> {
    let client = ClientSettings::default().build().unwrap();
    pull(
        &client,
        PullRequest {
            package: pkg,
            cache,
            dest_dir: dest,
            force,
            parallelism,
        },
        &reporter(),
    )
    .await
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_pull_without_checksum() {
    let server = TestServer::start(HashMap::from([(
        "/sample.csv".to_string(),
        Route::Body(CONTENT.to_vec()),
    )]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    let pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![source(server.url("/sample.csv"), None)],
    );

    let outcome = run_pull(&pkg, &cache, &dest, false, 1).await.unwrap();

    assert_eq!(outcome.files.len(), 1);
    assert_eq!(std::fs::read(dest.join("sample.csv")).unwrap(), CONTENT);
    let cached = cache
        .version_dir("simkjels/samples/sampledata", "0.1.0")
        .join("sample.csv");
    assert_eq!(std::fs::read(cached).unwrap(), CONTENT);
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn fresh_pull_with_correct_checksum() {
    let server = TestServer::start(HashMap::from([(
        "/sample.csv".to_string(),
        Route::Body(CONTENT.to_vec()),
    )]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    let token = format!("sha256:{}", sha256_hex(CONTENT));
    let pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![source(server.url("/sample.csv"), Some(token))],
    );

    run_pull(&pkg, &cache, &dest, false, 1).await.unwrap();
    assert_eq!(std::fs::read(dest.join("sample.csv")).unwrap(), CONTENT);
}

#[tokio::test]
async fn wrong_checksum_fails_and_cleans_up() {
    let server = TestServer::start(HashMap::from([(
        "/sample.csv".to_string(),
        Route::Body(CONTENT.to_vec()),
    )]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    let bad = format!("sha256:{}", "0".repeat(64));
    let pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![source(server.url("/sample.csv"), Some(bad))],
    );

    let err = run_pull(&pkg, &cache, &dest, false, 1).await.unwrap_err();
    assert!(matches!(err, PullError::Checksum { .. }));
    assert!(!err.is_network());

    assert!(!dest.join("sample.csv").exists());
    let cached = cache
        .version_dir("simkjels/samples/sampledata", "0.1.0")
        .join("sample.csv");
    assert!(!cached.exists());
}

#[tokio::test]
async fn second_pull_is_idempotent_with_zero_network_calls() {
    let server = TestServer::start(HashMap::from([(
        "/sample.csv".to_string(),
        Route::Body(CONTENT.to_vec()),
    )]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    let token = format!("sha256:{}", sha256_hex(CONTENT));
    let pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![source(server.url("/sample.csv"), Some(token))],
    );

    run_pull(&pkg, &cache, &dest, false, 1).await.unwrap();
    assert_eq!(server.hits(), 1);

    let outcome = run_pull(&pkg, &cache, &dest, false, 1).await.unwrap();
    assert_eq!(server.hits(), 1, "second pull must not touch the network");
    assert_eq!(std::fs::read(dest.join("sample.csv")).unwrap(), CONTENT);
    assert_eq!(
        outcome.files[0].provenance,
        datum_core::Provenance::Destination
    );
}

#[tokio::test]
async fn cache_hit_without_destination_copies_from_cache() {
    let server = TestServer::start(HashMap::from([(
        "/sample.csv".to_string(),
        Route::Body(CONTENT.to_vec()),
    )]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest_a = dir.path().join("dest-a");
    let dest_b = dir.path().join("dest-b");

    let token = format!("sha256:{}", sha256_hex(CONTENT));
    let pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![source(server.url("/sample.csv"), Some(token))],
    );

    run_pull(&pkg, &cache, &dest_a, false, 1).await.unwrap();
    let outcome = run_pull(&pkg, &cache, &dest_b, false, 1).await.unwrap();

    assert_eq!(server.hits(), 1);
    assert_eq!(outcome.files[0].provenance, datum_core::Provenance::Cache);
    assert_eq!(std::fs::read(dest_b.join("sample.csv")).unwrap(), CONTENT);
}

#[tokio::test]
async fn corrupt_cache_self_heals() {
    let server = TestServer::start(HashMap::from([(
        "/sample.csv".to_string(),
        Route::Body(CONTENT.to_vec()),
    )]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    // seed a cache entry whose bytes do not match the declared digest
    let version_dir = cache.version_dir("simkjels/samples/sampledata", "0.1.0");
    std::fs::create_dir_all(&version_dir).unwrap();
    std::fs::write(version_dir.join("sample.csv"), b"corrupted bytes").unwrap();

    let token = format!("sha256:{}", sha256_hex(CONTENT));
    let pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![source(server.url("/sample.csv"), Some(token))],
    );

    run_pull(&pkg, &cache, &dest, false, 1).await.unwrap();

    assert_eq!(server.hits(), 1, "corrupt cache entry must be re-fetched");
    assert_eq!(
        std::fs::read(version_dir.join("sample.csv")).unwrap(),
        CONTENT
    );
    assert_eq!(std::fs::read(dest.join("sample.csv")).unwrap(), CONTENT);
}

#[tokio::test]
async fn partial_failure_leaves_destination_untouched() {
    let server = TestServer::start(HashMap::from([
        ("/a.csv".to_string(), Route::Body(CONTENT.to_vec())),
        ("/b.csv".to_string(), Route::Error(500)),
    ]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    let pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![
            source(server.url("/a.csv"), None),
            source(server.url("/b.csv"), None),
        ],
    );

    let err = run_pull(&pkg, &cache, &dest, false, 1).await.unwrap_err();
    assert!(err.is_network());

    assert!(!dest.join("a.csv").exists());
    assert!(!dest.join("b.csv").exists());
}

#[tokio::test]
async fn force_bypasses_destination_and_cache() {
    let server = TestServer::start(HashMap::from([(
        "/sample.csv".to_string(),
        Route::Body(CONTENT.to_vec()),
    )]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    let token = format!("sha256:{}", sha256_hex(CONTENT));
    let pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![source(server.url("/sample.csv"), Some(token))],
    );

    run_pull(&pkg, &cache, &dest, false, 1).await.unwrap();
    assert_eq!(server.hits(), 1);

    run_pull(&pkg, &cache, &dest, true, 1).await.unwrap();
    assert_eq!(server.hits(), 2, "force must re-fetch from the network");
}

#[tokio::test]
async fn parallel_pull_matches_serial_content() {
    let paths: Vec<String> = (0..5).map(|i| format!("/file{i}.csv")).collect();
    let mut routes = HashMap::new();
    for (i, path) in paths.iter().enumerate() {
        routes.insert(
            path.clone(),
            Route::Body(format!("payload-{i}\n").into_bytes()),
        );
    }
    let server = TestServer::start(routes).await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    let sources: Vec<Source> = paths.iter().map(|p| source(server.url(p), None)).collect();
    let pkg = package("simkjels/samples/sampledata", "0.1.0", sources);

    let outcome = run_pull(&pkg, &cache, &dest, false, 4).await.unwrap();

    assert_eq!(outcome.files.len(), 5);
    assert_eq!(server.hits(), 5);
    for i in 0..5 {
        assert_eq!(
            std::fs::read(dest.join(format!("file{i}.csv"))).unwrap(),
            format!("payload-{i}\n").as_bytes()
        );
    }
}

#[tokio::test]
async fn parallel_pull_aborts_siblings_on_failure() {
    let mut routes = HashMap::new();
    for i in 0..4 {
        routes.insert(
            format!("/ok{i}.csv"),
            Route::Body(format!("payload-{i}\n").into_bytes()),
        );
    }
    routes.insert("/bad.csv".to_string(), Route::Error(500));
    let server = TestServer::start(routes).await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    let mut sources: Vec<Source> = (0..4)
        .map(|i| source(server.url(&format!("/ok{i}.csv")), None))
        .collect();
    sources.push(source(server.url("/bad.csv"), None));
    let pkg = package("simkjels/samples/sampledata", "0.1.0", sources);

    let err = run_pull(&pkg, &cache, &dest, false, 4).await.unwrap_err();
    assert!(err.is_network());
    assert!(!dest.exists() || std::fs::read_dir(&dest).unwrap().next().is_none());
}

#[tokio::test]
async fn staging_is_removed_on_every_exit_path() {
    let server = TestServer::start(HashMap::from([
        ("/a.csv".to_string(), Route::Body(CONTENT.to_vec())),
        ("/b.csv".to_string(), Route::Error(500)),
    ]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayout::new(dir.path().join("cache"));
    let dest = dir.path().join("dest");

    // success path
    let ok_pkg = package(
        "simkjels/samples/sampledata",
        "0.1.0",
        vec![source(server.url("/a.csv"), None)],
    );
    run_pull(&ok_pkg, &cache, &dest, false, 1).await.unwrap();

    // failure path
    let bad_pkg = package(
        "simkjels/samples/other",
        "0.1.0",
        vec![source(server.url("/b.csv"), None)],
    );
    let _ = run_pull(&bad_pkg, &cache, &dest, false, 1).await;

    let staging_parent = cache.staging_parent();
    if staging_parent.exists() {
        assert!(
            std::fs::read_dir(&staging_parent).unwrap().next().is_none(),
            "staging directories must not accumulate"
        );
    }
}

#[tokio::test]
async fn update_scan_reports_pending_transition() {
    let dir = tempfile::tempdir().unwrap();
    let cache_root = dir.path().join("cache");
    let registry_root = dir.path().join("registry");

    // cached 0.1.0
    let layout = CacheLayout::new(&cache_root);
    let old_dir = layout.version_dir("simkjels/samples/sampledata", "0.1.0");
    std::fs::create_dir_all(&old_dir).unwrap();
    std::fs::write(old_dir.join("sample.csv"), CONTENT).unwrap();

    // registry latest 0.2.0
    let registry = Registry::local(&registry_root);
    let server = TestServer::start(HashMap::from([(
        "/sample.csv".to_string(),
        Route::Body(CONTENT.to_vec()),
    )]))
    .await;
    let newer = package(
        "simkjels/samples/sampledata",
        "0.2.0",
        vec![source(server.url("/sample.csv"), None)],
    );
    registry.publish(&newer, false).await.unwrap();

    let ids = datum_core::cached_dataset_ids(&cache_root);
    assert_eq!(ids, vec!["simkjels/samples/sampledata"]);

    let checks = scan_updates(&registry, &cache_root, &ids, false).await.unwrap();
    assert_eq!(checks.len(), 1);
    assert!(checks[0].needs_update);
    assert_eq!(checks[0].current.as_deref(), Some("0.1.0"));
    assert_eq!(checks[0].latest(), "0.2.0");

    // run the pull the scanner would drive and confirm both versions
    // end up cached side by side
    let dest = dir.path().join("dest");
    run_pull(&checks[0].package, &layout, &dest, false, 1)
        .await
        .unwrap();

    assert!(
        layout
            .version_dir("simkjels/samples/sampledata", "0.2.0")
            .join("sample.csv")
            .exists()
    );
    assert_eq!(std::fs::read(old_dir.join("sample.csv")).unwrap(), CONTENT);
}

#[tokio::test]
async fn update_scan_skips_unpublished_datasets() {
    let dir = tempfile::tempdir().unwrap();
    let cache_root = dir.path().join("cache");

    let layout = CacheLayout::new(&cache_root);
    let ver_dir = layout.version_dir("gone/from/registry", "0.1.0");
    std::fs::create_dir_all(&ver_dir).unwrap();
    std::fs::write(ver_dir.join("data.csv"), b"x").unwrap();

    let registry = Registry::local(dir.path().join("registry"));
    let ids = datum_core::cached_dataset_ids(&cache_root);
    let checks = scan_updates(&registry, &cache_root, &ids, false).await.unwrap();
    assert!(checks.is_empty());
}
