//! # Cache events
//!
//! Hooks the cache calls whenever something observable happens. The
//! default sink records Prometheus-style metrics through the `metrics`
//! facade; without an installed recorder every call is a no-op.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// How a single artifact request was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
    Hit,
    Miss,
    Rejected,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Hit => "hit",
            RequestOutcome::Miss => "miss",
            RequestOutcome::Rejected => "bad_request",
        }
    }
}

/// Result of one download attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadOutcome {
    Success,
    Failure,
}

impl DownloadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadOutcome::Success => "success",
            DownloadOutcome::Failure => "failure",
        }
    }
}

pub trait CacheEvents: Send + Sync {
    fn request(&self, outcome: RequestOutcome);

    fn job_queued(&self);

    fn job_dropped(&self);

    /// A worker discarded a job because the same artifact is already being fetched
    fn job_deduplicated(&self);

    fn queue_depth(&self, depth: usize);

    fn inflight(&self, count: usize);

    fn download_finished(&self, outcome: DownloadOutcome, elapsed: Duration);
}

/// Records events as `articache_*` metrics
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsEvents;

impl CacheEvents for MetricsEvents {
    fn request(&self, outcome: RequestOutcome) {
        counter!("articache_http_requests_total", "result" => outcome.as_str()).increment(1);
        match outcome {
            RequestOutcome::Hit => counter!("articache_cache_hits_total").increment(1),
            RequestOutcome::Miss => counter!("articache_cache_misses_total").increment(1),
            RequestOutcome::Rejected => {}
        }
    }

    fn job_queued(&self) {
        counter!("articache_downloads_queued_total").increment(1);
    }

    fn job_dropped(&self) {
        counter!("articache_downloads_queue_dropped_total").increment(1);
    }

    fn job_deduplicated(&self) {
        counter!("articache_downloads_deduplicated_total").increment(1);
    }

    fn queue_depth(&self, depth: usize) {
        gauge!("articache_download_queue_depth").set(depth as f64);
    }

    fn inflight(&self, count: usize) {
        gauge!("articache_downloads_inflight").set(count as f64);
    }

    fn download_finished(&self, outcome: DownloadOutcome, elapsed: Duration) {
        counter!("articache_downloads_total", "outcome" => outcome.as_str()).increment(1);
        histogram!("articache_download_duration_seconds").record(elapsed.as_secs_f64());
    }
}

/// Register help texts for every metric recorded by [`MetricsEvents`].
pub fn describe_metrics() {
    describe_counter!(
        "articache_http_requests_total",
        "Total number of HTTP artifact requests handled by Articache."
    );
    describe_counter!(
        "articache_cache_hits_total",
        "Total number of cache hits (served from local disk)."
    );
    describe_counter!(
        "articache_cache_misses_total",
        "Total number of cache misses (redirected upstream)."
    );
    describe_counter!(
        "articache_downloads_queued_total",
        "Total number of async download jobs queued."
    );
    describe_counter!(
        "articache_downloads_queue_dropped_total",
        "Total number of async download jobs dropped due to a full queue."
    );
    describe_counter!(
        "articache_downloads_deduplicated_total",
        "Total number of download jobs skipped because the artifact was already in flight."
    );
    describe_gauge!(
        "articache_download_queue_depth",
        "Current depth of the async download queue."
    );
    describe_gauge!(
        "articache_downloads_inflight",
        "Number of downloads currently in progress."
    );
    describe_counter!(
        "articache_downloads_total",
        "Total number of download attempts performed by Articache."
    );
    describe_histogram!(
        "articache_download_duration_seconds",
        "Time spent downloading an artifact from the upstream repository."
    );
}
