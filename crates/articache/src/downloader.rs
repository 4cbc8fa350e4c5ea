//! # Downloader
//!
//! Fetches one artifact from its upstream repository and materializes it
//! below the cache root. Content only becomes visible at the final path
//! through a rename of a fully written temporary file living in the same
//! directory, so readers see either nothing or the complete artifact.

use std::path::Path;
use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::job::ArtifactJob;
use crate::path::{ResolvedPath, resolve};

/// Fetch strategy used by the worker pool
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `job` and store it under `cache_root`, returning the number of bytes written.
    async fn download(&self, cache_root: &Path, job: &ArtifactJob) -> CacheResult<u64>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &CacheConfig) -> CacheResult<Client> {
    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(config.workers.max(1))
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(10));

    if !config.download_timeout.is_zero() {
        client_builder = client_builder.timeout(config.download_timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(CacheError::from)
}

/// Downloads artifacts over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    timeout: Duration,
}

impl HttpDownloader {
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        Ok(Self::with_client(
            create_client(config)?,
            config.download_timeout,
        ))
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn fetch(&self, cache_root: &Path, job: &ArtifactJob) -> CacheResult<u64> {
        let target = resolve(cache_root, job.name())?;
        let url = job.url();

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Status { url, status });
        }

        debug!(url = %url, status = %status, "Streaming artifact from upstream");
        persist_stream(&target, response.bytes_stream()).await
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, cache_root: &Path, job: &ArtifactJob) -> CacheResult<u64> {
        match tokio::time::timeout(self.timeout, self.fetch(cache_root, job)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                url: job.url(),
                timeout: self.timeout,
            }),
        }
    }
}

/// Write `stream` to `target`, creating missing parent directories.
///
/// Bytes go to `<file-name>.<random>.tmp` next to the target first; the
/// temporary file is removed on every error path, including cancellation.
pub async fn persist_stream<S, E>(target: &ResolvedPath, stream: S) -> CacheResult<u64>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<CacheError>,
{
    let path = target.path();
    let (dir, file_name) = match (path.parent(), path.file_name()) {
        (Some(dir), Some(file_name)) => (dir, file_name.to_string_lossy()),
        _ => return Err(CacheError::InvalidPath(target.key().to_owned())),
    };

    // Concurrent creation of the same tree is fine: existing directories are not an error.
    fs::create_dir_all(dir)
        .await
        .map_err(|e| CacheError::persist(dir, e))?;

    let temp = tempfile::Builder::new()
        .prefix(&format!("{file_name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| CacheError::persist(dir, e))?;
    let (file, temp_path) = temp.into_parts();
    let mut file = fs::File::from_std(file);

    let mut stream = pin!(stream);
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| CacheError::persist(&*temp_path, e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| CacheError::persist(&*temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| CacheError::persist(&*temp_path, e))?;
    drop(file);

    temp_path
        .persist(path)
        .map_err(|e| CacheError::persist(path, e.error))?;

    debug!(path = %path.display(), bytes = written, "Artifact persisted");
    Ok(written)
}
