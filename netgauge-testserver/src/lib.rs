use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_DOWNLOAD: &str = "/download";
pub const PATH_UPLOAD: &str = "/upload";
pub const PATH_SLOW: &str = "/slow";
pub const PATH_BROKEN: &str = "/broken";

/// Body size served by `/download` when no `bytes` query parameter is given.
pub const DEFAULT_DOWNLOAD_BYTES: usize = 256 * 1024;
const MAX_DOWNLOAD_BYTES: usize = 64 * 1024 * 1024;

/// How long `/slow` stalls before answering. Longer than any probe timeout used in tests.
pub const SLOW_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    bytes_downloaded: Arc<AtomicU64>,
    bytes_uploaded: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn add_bytes_downloaded(&self, n: u64) {
        self.bytes_downloaded.fetch_add(n, Ordering::Relaxed);
    }

    fn add_bytes_uploaded(&self, n: u64) {
        self.bytes_uploaded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded.load(Ordering::Relaxed)
    }

    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct TestServerUrls {
    pub base_url: String,
    pub download: String,
    pub upload: String,
    pub slow: String,
    pub broken: String,
}

impl TestServerUrls {
    pub fn new(base_url: String) -> Self {
        Self {
            download: format!("{base_url}{PATH_DOWNLOAD}"),
            upload: format!("{base_url}{PATH_UPLOAD}"),
            slow: format!("{base_url}{PATH_SLOW}"),
            broken: format!("{base_url}{PATH_BROKEN}"),
            base_url,
        }
    }

    /// `/download` URL serving exactly `bytes` bytes.
    pub fn download_sized(&self, bytes: usize) -> String {
        format!("{}?bytes={bytes}", self.download)
    }
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    bytes: Option<usize>,
}

async fn handle_download(
    State(stats): State<TestServerStats>,
    Query(query): Query<DownloadQuery>,
) -> Bytes {
    stats.inc_requests_total();

    let n = query
        .bytes
        .unwrap_or(DEFAULT_DOWNLOAD_BYTES)
        .min(MAX_DOWNLOAD_BYTES);
    stats.add_bytes_downloaded(n as u64);

    Bytes::from(vec![0u8; n])
}

async fn handle_upload(State(stats): State<TestServerStats>, body: Bytes) -> String {
    stats.inc_requests_total();
    stats.add_bytes_uploaded(body.len() as u64);
    body.len().to_string()
}

async fn handle_slow(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    sleep(SLOW_DELAY).await;
    "slow"
}

async fn handle_broken(State(stats): State<TestServerStats>) -> StatusCode {
    stats.inc_requests_total();
    StatusCode::INTERNAL_SERVER_ERROR
}

pub fn router(stats: TestServerStats) -> Router {
    Router::new()
        .route(PATH_DOWNLOAD, get(handle_download))
        .route(PATH_UPLOAD, post(handle_upload))
        .route(PATH_SLOW, get(handle_slow))
        .route(PATH_BROKEN, get(handle_broken))
        .with_state(stats)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    urls: TestServerUrls,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();

        let app = router(stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");
        let urls = TestServerUrls::new(base_url.clone());

        Ok(Self {
            addr,
            base_url,
            urls,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn urls(&self) -> &TestServerUrls {
        &self.urls
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
