// Download worker pool: drains the job queue with at most one in-flight fetch per artifact.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::downloader::Downloader;
use crate::events::{CacheEvents, DownloadOutcome};
use crate::job::{ArtifactJob, SharedReceiver};

/// Artifact keys with a download in progress
#[derive(Debug, Default)]
pub struct InflightSet {
    keys: Mutex<HashSet<String>>,
}

impl InflightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for the calling worker. Returns `None` when another worker holds it.
    ///
    /// The lock is only held for the set operation; the returned guard
    /// releases the key when dropped.
    pub fn try_claim(self: &Arc<Self>, key: &str) -> Option<InflightGuard> {
        if !self.keys.lock().insert(key.to_owned()) {
            return None;
        }
        Some(InflightGuard {
            set: Arc::clone(self),
            key: key.to_owned(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

/// Ownership of one in-flight artifact key
#[derive(Debug)]
pub struct InflightGuard {
    set: Arc<InflightSet>,
    key: String,
}

impl InflightGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.set.keys.lock().remove(&self.key);
    }
}

/// Everything a worker needs, shared by all workers of a pool
pub(crate) struct WorkerContext {
    pub(crate) cache_root: PathBuf,
    pub(crate) receiver: SharedReceiver,
    pub(crate) inflight: Arc<InflightSet>,
    pub(crate) downloader: Arc<dyn Downloader>,
    pub(crate) events: Arc<dyn CacheEvents>,
}

impl WorkerContext {
    async fn next_job(&self) -> Option<ArtifactJob> {
        let mut receiver = self.receiver.lock().await;
        let job = receiver.recv().await?;
        self.events.queue_depth(receiver.len());
        Some(job)
    }

    async fn process(&self, job: ArtifactJob) {
        let Some(claim) = self.inflight.try_claim(job.name()) else {
            debug!(artifact = %job.name(), "Artifact already downloading, skipping duplicate job");
            self.events.job_deduplicated();
            return;
        };
        self.events.inflight(self.inflight.len());

        let url = job.url();
        let started = Instant::now();
        let result = AssertUnwindSafe(self.downloader.download(&self.cache_root, &job))
            .catch_unwind()
            .await;
        let elapsed = started.elapsed();

        match result {
            Ok(Ok(bytes)) => {
                info!(
                    url = %url,
                    bytes,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Successfully downloaded artifact"
                );
                self.events
                    .download_finished(DownloadOutcome::Success, elapsed);
            }
            Ok(Err(e)) => {
                warn!(url = %url, kind = e.kind(), error = %e, "Artifact download failed");
                self.events
                    .download_finished(DownloadOutcome::Failure, elapsed);
            }
            Err(_) => {
                error!(url = %url, "Downloader panicked");
                self.events
                    .download_finished(DownloadOutcome::Failure, elapsed);
            }
        }

        drop(claim);
        self.events.inflight(self.inflight.len());
    }
}

/// Handle to the running download workers
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn spawn(count: usize, context: Arc<WorkerContext>) -> Self {
        let handles = (0..count)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&context))))
            .collect();
        info!(workers = count, "Download worker pool started");
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit. Workers stop once the job queue is closed and drained.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!(error = %e, "Download worker panicked");
                }
            }
        }
    }

    /// Cancel all workers. Downloads in progress are dropped and their temporary files removed.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

async fn run_worker(id: usize, context: Arc<WorkerContext>) {
    debug!(worker = id, "Download worker started");
    while let Some(job) = context.next_job().await {
        context.process(job).await;
    }
    debug!(worker = id, "Download queue closed, worker exiting");
}
