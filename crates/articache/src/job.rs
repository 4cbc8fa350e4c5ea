//! # Download jobs
//!
//! The bounded queue connecting the request handlers (producers) with the
//! worker pool (consumers).

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::error::{CacheError, CacheResult};

/// A request to fetch one artifact from an upstream repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactJob {
    name: String,
    repository: String,
}

impl ArtifactJob {
    pub fn new(name: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repository: repository.into(),
        }
    }

    /// Artifact path as requested, also the deduplication key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL of the repository the artifact is fetched from
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Full upstream URL of the artifact
    pub fn url(&self) -> String {
        format!("{}{}", self.repository.trim_end_matches('/'), self.name)
    }
}

/// Receiving half shared by every worker
pub type SharedReceiver = Arc<Mutex<mpsc::Receiver<ArtifactJob>>>;

/// Producer side of the job queue
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<ArtifactJob>,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    pub fn bounded(capacity: usize) -> (Self, SharedReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, Arc::new(Mutex::new(rx)))
    }

    /// Enqueue without waiting. A full queue drops the job.
    pub fn try_enqueue(&self, job: ArtifactJob) -> CacheResult<()> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => CacheError::QueueFull(job.name),
            mpsc::error::TrySendError::Closed(_) => CacheError::QueueClosed,
        })
    }

    /// Number of jobs waiting to be picked up
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}
