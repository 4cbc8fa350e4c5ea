//! Shared helpers for unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::http::{StatusCode, Uri};
use bytes::Bytes;
use futures::{StreamExt, stream};
use parking_lot::Mutex;

use crate::downloader::{Downloader, persist_stream};
use crate::error::{CacheError, CacheResult};
use crate::events::{CacheEvents, DownloadOutcome, RequestOutcome};
use crate::job::ArtifactJob;
use crate::path::resolve;

/// Macro to initialize tracing for tests
///
/// Usage:
/// - `init_test_tracing!()` - uses DEBUG level (default)
/// - `init_test_tracing!(INFO)` - uses specified level
#[macro_export]
macro_rules! init_test_tracing {
    () => {
        $crate::init_test_tracing!(DEBUG);
    };
    ($level:ident) => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::$level)
            .with_test_writer()
            .try_init();
    };
}

#[derive(Debug, Clone, Default)]
struct Script {
    body: Vec<u8>,
    delay: Duration,
    chunk_delay: Duration,
    status: Option<StatusCode>,
    panic: bool,
}

#[derive(Debug, Default)]
struct CallState {
    calls: HashMap<String, usize>,
    active: HashMap<String, usize>,
    high_water: HashMap<String, usize>,
    active_total: usize,
    max_concurrent: usize,
}

/// Downloader double answering from scripted responses keyed by artifact path.
///
/// Records how many calls each key received and the highest number of
/// simultaneous calls observed per key.
#[derive(Debug, Default)]
pub(crate) struct ScriptedDownloader {
    scripts: HashMap<String, Script>,
    state: Mutex<CallState>,
}

impl ScriptedDownloader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(mut self, key: &str, body: &[u8], delay: Duration) -> Self {
        self.scripts.insert(
            key.to_owned(),
            Script {
                body: body.to_vec(),
                delay,
                ..Default::default()
            },
        );
        self
    }

    /// Stream `body` in small chunks, pausing `chunk_delay` before each one.
    pub(crate) fn with_slow_body(mut self, key: &str, body: &[u8], chunk_delay: Duration) -> Self {
        self.scripts.insert(
            key.to_owned(),
            Script {
                body: body.to_vec(),
                chunk_delay,
                ..Default::default()
            },
        );
        self
    }

    pub(crate) fn failing(mut self, key: &str, status: StatusCode) -> Self {
        self.scripts.insert(
            key.to_owned(),
            Script {
                status: Some(status),
                ..Default::default()
            },
        );
        self
    }

    pub(crate) fn panicking(mut self, key: &str) -> Self {
        self.scripts.insert(
            key.to_owned(),
            Script {
                panic: true,
                ..Default::default()
            },
        );
        self
    }

    pub(crate) fn calls(&self, key: &str) -> usize {
        self.state.lock().calls.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    pub(crate) fn high_water(&self, key: &str) -> usize {
        self.state.lock().high_water.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn max_concurrent(&self) -> usize {
        self.state.lock().max_concurrent
    }

    fn enter(&self, key: &str) {
        let mut state = self.state.lock();
        *state.calls.entry(key.to_owned()).or_default() += 1;
        let active = {
            let active = state.active.entry(key.to_owned()).or_default();
            *active += 1;
            *active
        };
        let high_water = state.high_water.entry(key.to_owned()).or_default();
        *high_water = (*high_water).max(active);
        state.active_total += 1;
        state.max_concurrent = state.max_concurrent.max(state.active_total);
    }

    fn leave(&self, key: &str) {
        let mut state = self.state.lock();
        if let Some(active) = state.active.get_mut(key) {
            *active -= 1;
        }
        state.active_total -= 1;
    }
}

struct ActiveCall<'a> {
    downloader: &'a ScriptedDownloader,
    key: String,
}

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        self.downloader.leave(&self.key);
    }
}

#[async_trait]
impl Downloader for ScriptedDownloader {
    async fn download(&self, cache_root: &Path, job: &ArtifactJob) -> CacheResult<u64> {
        self.enter(job.name());
        let _active = ActiveCall {
            downloader: self,
            key: job.name().to_owned(),
        };

        let Some(script) = self.scripts.get(job.name()).cloned() else {
            return Err(CacheError::Status {
                url: job.url(),
                status: StatusCode::NOT_FOUND,
            });
        };

        tokio::time::sleep(script.delay).await;
        if script.panic {
            panic!("scripted panic for {}", job.name());
        }
        if let Some(status) = script.status {
            return Err(CacheError::Status {
                url: job.url(),
                status,
            });
        }

        let target = resolve(cache_root, job.name())?;
        let chunk_delay = script.chunk_delay;
        let chunks: Vec<Bytes> = script
            .body
            .chunks(4)
            .map(Bytes::copy_from_slice)
            .collect();
        let body = stream::iter(chunks).then(move |chunk| async move {
            tokio::time::sleep(chunk_delay).await;
            Ok::<_, CacheError>(chunk)
        });
        persist_stream(&target, body).await
    }
}

/// Events sink counting every callback
#[derive(Debug, Default)]
pub(crate) struct CountingEvents {
    hits: AtomicUsize,
    misses: AtomicUsize,
    rejected: AtomicUsize,
    queued: AtomicUsize,
    dropped: AtomicUsize,
    deduplicated: AtomicUsize,
    successes: AtomicUsize,
    failures: AtomicUsize,
    max_inflight: AtomicUsize,
    depths: Mutex<Vec<usize>>,
}

impl CountingEvents {
    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub(crate) fn misses(&self) -> usize {
        self.misses.load(Ordering::SeqCst)
    }

    pub(crate) fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    pub(crate) fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub(crate) fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub(crate) fn deduplicated(&self) -> usize {
        self.deduplicated.load(Ordering::SeqCst)
    }

    pub(crate) fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub(crate) fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    pub(crate) fn finished(&self) -> usize {
        self.successes() + self.failures()
    }

    pub(crate) fn max_inflight(&self) -> usize {
        self.max_inflight.load(Ordering::SeqCst)
    }

    /// Last reported queue depth, if any
    pub(crate) fn last_queue_depth(&self) -> Option<usize> {
        self.depths.lock().last().copied()
    }
}

impl CacheEvents for CountingEvents {
    fn request(&self, outcome: RequestOutcome) {
        let counter = match outcome {
            RequestOutcome::Hit => &self.hits,
            RequestOutcome::Miss => &self.misses,
            RequestOutcome::Rejected => &self.rejected,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn job_queued(&self) {
        self.queued.fetch_add(1, Ordering::SeqCst);
    }

    fn job_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }

    fn job_deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::SeqCst);
    }

    fn queue_depth(&self, depth: usize) {
        self.depths.lock().push(depth);
    }

    fn inflight(&self, count: usize) {
        self.max_inflight.fetch_max(count, Ordering::SeqCst);
    }

    fn download_finished(&self, outcome: DownloadOutcome, _elapsed: Duration) {
        let counter = match outcome {
            DownloadOutcome::Success => &self.successes,
            DownloadOutcome::Failure => &self.failures,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub(crate) async fn eventually(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Temporary download files left in `dir`
pub(crate) fn tmp_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "tmp"))
        .collect()
}

/// Serve `files` over HTTP on an ephemeral port, answering every request after `delay`.
/// Returns the base URL.
pub(crate) async fn spawn_upstream<'a>(
    files: impl IntoIterator<Item = (&'a str, Vec<u8>)>,
    delay: Duration,
) -> String {
    let files: Arc<HashMap<String, Vec<u8>>> = Arc::new(
        files
            .into_iter()
            .map(|(path, body)| (path.to_owned(), body))
            .collect(),
    );

    let app = Router::new().fallback(move |uri: Uri| {
        let files = Arc::clone(&files);
        async move {
            tokio::time::sleep(delay).await;
            match files.get(uri.path()) {
                Some(body) => (StatusCode::OK, body.clone()),
                None => (StatusCode::NOT_FOUND, Vec::new()),
            }
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream listener");
    let addr = listener.local_addr().expect("upstream local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve upstream");
    });
    format!("http://{addr}")
}
