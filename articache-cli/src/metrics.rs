use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::AppError;

/// Install the Prometheus recorder without its own listener.
///
/// The returned handle is rendered by the maintenance server.
pub fn init_metrics() -> Result<PrometheusHandle, AppError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Initialization(format!("metrics recorder: {e}")))?;
    articache::describe_metrics();
    Ok(handle)
}
