//! # Articache
//!
//! A pull-through cache for binary artifacts published in Maven-style
//! repositories. Requests for artifacts already on local disk are served
//! directly; anything else is redirected to the upstream repository while a
//! background worker fetches it, so the next request becomes a hit.
//!
//! ## Features
//!
//! - Non-blocking request path: misses never wait on the upstream
//! - Bounded download queue with drop-on-full backpressure
//! - At most one in-flight download per artifact
//! - Atomic materialization via same-directory temporary files
//! - Path sanitization keeping every file below the cache root

pub mod builder;
pub mod config;
pub mod downloader;
pub mod error;
pub mod events;
pub mod gateway;
pub mod http;
pub mod job;
pub mod path;
pub mod worker;

#[cfg(test)]
mod test_utils;

pub use builder::CacheConfigBuilder;
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use gateway::{ArtifactCache, ArtifactResponse};
pub use http::router;

pub use downloader::{Downloader, HttpDownloader, create_client, persist_stream};
pub use events::{CacheEvents, DownloadOutcome, MetricsEvents, RequestOutcome, describe_metrics};
pub use job::{ArtifactJob, JobQueue};
pub use path::{ResolvedPath, resolve};
pub use worker::{InflightSet, WorkerPool};
