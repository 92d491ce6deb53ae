//! # Observability Infrastructure
//!
//! Structured logging via tracing and Prometheus metrics for the service.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{init_metrics, track_http_metrics, MetricsRecorder};

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;
use metrics_exporter_prometheus::PrometheusHandle;

/// Initialize logging and the Prometheus recorder.
///
/// Returns the handle used to render `/metrics`.
pub fn init_observability(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    init_logging(config);
    let handle = init_metrics()?;

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        "Observability initialized"
    );

    Ok(handle)
}
