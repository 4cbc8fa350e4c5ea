use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Pull-through cache for Maven-style artifact repositories",
    long_about = "Serves artifacts from a local cache directory.\n\
                  \n\
                  Artifacts missing from the cache are answered with a redirect to the\n\
                  upstream repository while a background worker downloads them, so the\n\
                  next request is served from disk."
)]
pub struct CliArgs {
    /// Address of the artifact server
    #[arg(
        long,
        env = "ARTICACHE_ADDR",
        default_value = "0.0.0.0:8080",
        help = "Address the artifact server listens on"
    )]
    pub addr: SocketAddr,

    /// Address of the maintenance server
    #[arg(
        long,
        env = "ARTICACHE_MAINTENANCE_ADDR",
        default_value = "0.0.0.0:8081",
        help = "Address serving /healthz and /metrics"
    )]
    pub maintenance_addr: SocketAddr,

    /// Cache directory
    #[arg(
        long,
        env = "ARTICACHE_PATH",
        default_value = articache::config::DEFAULT_CACHE_ROOT,
        help = "Directory where cached artifacts are stored"
    )]
    pub path: PathBuf,

    /// Upstream repository
    #[arg(
        long,
        env = "ARTICACHE_REPO",
        default_value = articache::config::DEFAULT_UPSTREAM,
        help = "Base URL of the upstream repository"
    )]
    pub repo: String,

    #[arg(
        long,
        env = "ARTICACHE_WORKERS",
        default_value_t = articache::config::DEFAULT_WORKERS,
        help = "Number of background download workers"
    )]
    pub workers: usize,

    #[arg(
        long,
        env = "ARTICACHE_QUEUE_CAPACITY",
        default_value_t = articache::config::DEFAULT_QUEUE_CAPACITY,
        help = "Maximum number of pending download jobs; further misses skip the download"
    )]
    pub queue_capacity: usize,

    /// Per-download timeout in seconds
    #[arg(
        long,
        env = "ARTICACHE_DOWNLOAD_TIMEOUT",
        default_value = "120",
        help = "Timeout for a single artifact download in seconds"
    )]
    pub download_timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        env = "ARTICACHE_CONNECT_TIMEOUT",
        default_value = "10",
        help = "Timeout for establishing an upstream connection in seconds (0 disables it)"
    )]
    pub connect_timeout: u64,

    #[arg(
        long,
        env = "ARTICACHE_LOG_LEVEL",
        default_value = "info",
        help = "Log level: debug, info, warn or error"
    )]
    pub log_level: String,

    #[arg(
        long,
        env = "ARTICACHE_LOG_FORMAT",
        default_value = "json",
        help = "Log format: json or text"
    )]
    pub log_format: String,
}
