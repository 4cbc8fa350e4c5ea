use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{CacheError, CacheResult};

pub const DEFAULT_CACHE_ROOT: &str = "/tmp/articache_data";
pub const DEFAULT_UPSTREAM: &str = "https://repo.maven.apache.org/maven2";
pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

const DEFAULT_USER_AGENT: &str = concat!("articache/", env!("CARGO_PKG_VERSION"));

/// Configurable options for the artifact cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding every cached artifact
    pub cache_root: PathBuf,

    /// Base URL of the upstream repository, without a trailing slash
    pub upstream: String,

    /// Number of background download workers
    pub workers: usize,

    /// Capacity of the download job queue
    pub queue_capacity: usize,

    /// Upper bound for a single download attempt, body included
    pub download_timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// User agent sent to the upstream repository
    pub user_agent: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from(DEFAULT_CACHE_ROOT),
            upstream: DEFAULT_UPSTREAM.to_owned(),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            download_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl CacheConfig {
    pub fn builder() -> crate::builder::CacheConfigBuilder {
        crate::builder::CacheConfigBuilder::new()
    }

    /// Check the configuration for values the cache cannot run with.
    pub fn validate(&self) -> CacheResult<()> {
        let url = Url::parse(&self.upstream).map_err(|e| {
            CacheError::Config(format!("invalid upstream URL '{}': {e}", self.upstream))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CacheError::Config(format!(
                "upstream URL '{}' must use http or https",
                self.upstream
            )));
        }
        if self.workers == 0 {
            return Err(CacheError::Config("workers must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(CacheError::Config(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.download_timeout.is_zero() {
            return Err(CacheError::Config(
                "download timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn normalize_upstream(upstream: &str) -> String {
    upstream.trim().trim_end_matches('/').to_owned()
}
