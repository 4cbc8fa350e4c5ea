use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;

// Error type for every fallible cache operation
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid artifact path: {0}")]
    InvalidPath(String),

    #[error("Download queue is full, dropping job for {0}")]
    QueueFull(String),

    #[error("Download queue is closed")]
    QueueClosed,

    #[error("Worker pool already started")]
    AlreadyStarted,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status code {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("Download of {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Failed to persist {}: {source}", path.display())]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    pub(crate) fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::PersistFailed {
            path: path.into(),
            source,
        }
    }

    /// True for failures talking to the upstream repository (transport errors,
    /// non-success statuses and timeouts).
    pub fn is_download_failure(&self) -> bool {
        matches!(
            self,
            CacheError::Http(_) | CacheError::Status { .. } | CacheError::Timeout { .. }
        )
    }

    /// Short label used when reporting failed attempts.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::InvalidPath(_) => "invalid_path",
            CacheError::QueueFull(_) => "queue_full",
            CacheError::QueueClosed => "queue_closed",
            CacheError::AlreadyStarted => "already_started",
            CacheError::Http(_) | CacheError::Status { .. } | CacheError::Timeout { .. } => {
                "download_failed"
            }
            CacheError::PersistFailed { .. } => "persist_failed",
            CacheError::Config(_) => "config",
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
