//! # Cache Gateway
//!
//! Request-facing side of the cache. Every request ends in one of three
//! states: a hit served from disk, a miss redirected to the upstream
//! repository (with a best-effort background fetch), or a rejection of an
//! unsafe path. Answering a request never waits on the upstream.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, normalize_upstream};
use crate::downloader::{Downloader, HttpDownloader};
use crate::error::{CacheError, CacheResult};
use crate::events::{CacheEvents, MetricsEvents, RequestOutcome};
use crate::job::{ArtifactJob, JobQueue, SharedReceiver};
use crate::path::resolve;
use crate::worker::{InflightSet, WorkerContext, WorkerPool};

/// How the cache answers one artifact request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactResponse {
    /// The artifact is on disk at `path`
    Hit { path: PathBuf },
    /// Not cached yet; the caller should fetch `location` directly
    Miss { location: String },
    /// The request path is unsafe or names no file
    Rejected { reason: String },
}

pub struct ArtifactCache {
    cache_root: PathBuf,
    upstream: String,
    workers: usize,
    queue: JobQueue,
    receiver: SharedReceiver,
    inflight: Arc<InflightSet>,
    downloader: Arc<dyn Downloader>,
    events: Arc<dyn CacheEvents>,
    started: AtomicBool,
}

impl ArtifactCache {
    /// Create a cache fetching over HTTP and reporting through the `metrics` facade.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        let downloader = Arc::new(HttpDownloader::new(&config)?);
        Self::with_parts(config, downloader, Arc::new(MetricsEvents))
    }

    pub fn with_parts(
        config: CacheConfig,
        downloader: Arc<dyn Downloader>,
        events: Arc<dyn CacheEvents>,
    ) -> CacheResult<Self> {
        config.validate()?;
        let (queue, receiver) = JobQueue::bounded(config.queue_capacity);

        Ok(Self {
            cache_root: config.cache_root,
            upstream: normalize_upstream(&config.upstream),
            workers: config.workers,
            queue,
            receiver,
            inflight: Arc::new(InflightSet::new()),
            downloader,
            events,
            started: AtomicBool::new(false),
        })
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Worker count from the configuration
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Jobs waiting in the download queue
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Downloads currently in progress
    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Launch `workers` download workers on the current tokio runtime.
    ///
    /// Workers run until the cache is dropped, which closes the queue.
    pub fn start(&self, workers: usize) -> CacheResult<WorkerPool> {
        if workers == 0 {
            return Err(CacheError::Config("workers must be at least 1".to_string()));
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CacheError::AlreadyStarted);
        }

        let context = Arc::new(WorkerContext {
            cache_root: self.cache_root.clone(),
            receiver: Arc::clone(&self.receiver),
            inflight: Arc::clone(&self.inflight),
            downloader: Arc::clone(&self.downloader),
            events: Arc::clone(&self.events),
        });
        Ok(WorkerPool::spawn(workers, context))
    }

    /// Decide how to answer a request for `request_path`.
    pub async fn handle_request(&self, request_path: &str) -> ArtifactResponse {
        debug!(path = %request_path, "Requesting artifact");

        let resolved = match resolve(&self.cache_root, request_path) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(path = %request_path, error = %e, "Rejecting artifact request");
                self.events.request(RequestOutcome::Rejected);
                return ArtifactResponse::Rejected {
                    reason: e.to_string(),
                };
            }
        };

        if is_cached(resolved.path()).await {
            debug!(path = %request_path, "Found local artifact");
            self.events.request(RequestOutcome::Hit);
            return ArtifactResponse::Hit {
                path: resolved.into_path(),
            };
        }

        info!(path = %request_path, "Artifact not found in cache");
        self.events.request(RequestOutcome::Miss);

        // Aliased spellings of one artifact share the normalized key.
        let name = resolved.key().to_owned();
        let location = format!("{}{}", self.upstream, name);
        self.enqueue(ArtifactJob::new(name, self.upstream.clone()));

        ArtifactResponse::Miss { location }
    }

    fn enqueue(&self, job: ArtifactJob) {
        match self.queue.try_enqueue(job) {
            Ok(()) => self.events.job_queued(),
            Err(CacheError::QueueFull(name)) => {
                warn!(path = %name, "Download queue full; skipping async download");
                self.events.job_dropped();
            }
            Err(e) => {
                warn!(error = %e, "Failed to queue async download");
                self.events.job_dropped();
            }
        }
        self.events.queue_depth(self.queue.depth());
    }
}

async fn is_cached(path: &Path) -> bool {
    matches!(fs::metadata(path).await, Ok(metadata) if metadata.is_file())
}
