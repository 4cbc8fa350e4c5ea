//! # Builder for CacheConfig
//!
//! Fluent construction of [`CacheConfig`] instances.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use articache::CacheConfig;
//!
//! let config = CacheConfig::builder()
//!     .with_cache_root("/var/cache/articache")
//!     .with_upstream("https://repo.maven.apache.org/maven2/")
//!     .with_workers(8)
//!     .with_queue_capacity(256)
//!     .with_download_timeout(Duration::from_secs(60))
//!     .build();
//!
//! assert_eq!(config.upstream, "https://repo.maven.apache.org/maven2");
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{CacheConfig, normalize_upstream};

/// Builder for creating CacheConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
        }
    }

    /// Set the directory artifacts are stored under
    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.config.cache_root = cache_root.into();
        self
    }

    /// Set the upstream repository base URL. Trailing slashes are dropped.
    pub fn with_upstream(mut self, upstream: impl AsRef<str>) -> Self {
        self.config.upstream = normalize_upstream(upstream.as_ref());
        self
    }

    /// Set the number of background download workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the capacity of the download job queue
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the upper bound for one download attempt
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.config.download_timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the CacheConfig instance
    pub fn build(self) -> CacheConfig {
        self.config
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
