use std::sync::Arc;
use std::time::Duration;

use articache::{ArtifactCache, CacheConfig};
use clap::Parser;
use error::AppError;
use tracing::{error, info};

mod cli;
mod error;
mod logging;
mod metrics;
mod server;

use cli::CliArgs;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(e.exit_code());
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    logging::init(&args.log_level, &args.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        maintenance_addr = %args.maintenance_addr,
        path = %args.path.display(),
        repo = %args.repo,
        workers = args.workers,
        queue_capacity = args.queue_capacity,
        "Starting articache"
    );
    info!(
        "HTTP timeout configuration: download={}s, connect={}s",
        args.download_timeout, args.connect_timeout
    );

    tokio::fs::create_dir_all(&args.path).await?;

    let config = CacheConfig::builder()
        .with_cache_root(&args.path)
        .with_upstream(&args.repo)
        .with_workers(args.workers)
        .with_queue_capacity(args.queue_capacity)
        .with_download_timeout(Duration::from_secs(args.download_timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .build();
    config
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let cache = Arc::new(ArtifactCache::new(config)?);
    let workers = cache.start(cache.workers())?;

    let metrics = metrics::init_metrics()?;

    let artifacts = server::serve("artifact", args.addr, articache::router(Arc::clone(&cache)));
    let maintenance = server::serve(
        "maintenance",
        args.maintenance_addr,
        server::maintenance_router(metrics),
    );
    let result = tokio::try_join!(artifacts, maintenance).map(|_| ());

    workers.abort();
    info!("Download workers stopped");
    result
}
