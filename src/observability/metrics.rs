//! # Metrics Collection
//!
//! Prometheus metrics for HTTP traffic, secret fetches and the pool.

use crate::errors::{Error, Result};
use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Instant;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and return the render handle.
///
/// Idempotent: later calls return the handle installed by the first.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PROMETHEUS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| Error::internal(format!("Failed to install metrics recorder: {}", e)))?;
        describe_metrics();
        Ok::<_, Error>(handle)
    })?;
    Ok(handle.clone())
}

/// Register metric descriptions so they export with help text
fn describe_metrics() {
    describe_counter!("http_requests_total", Unit::Count, "Number of HTTP requests received");
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request latency in seconds"
    );
    describe_counter!(
        "secret_fetches_total",
        Unit::Count,
        "Number of credential fetches from the secret source"
    );
    describe_histogram!(
        "secret_fetch_duration_seconds",
        Unit::Seconds,
        "Credential fetch latency in seconds"
    );
    describe_counter!(
        "secret_refreshes_total",
        Unit::Count,
        "Number of pool rebuilds triggered by secret refreshes"
    );
    describe_gauge!("db_pool_connections", Unit::Count, "Database pool connections by state");
}

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration: f64) {
        let labels = [
            ("method", method.to_string()),
            ("path", path.to_string()),
            ("status", status.to_string()),
        ];
        counter!("http_requests_total", &labels).increment(1);

        let duration_labels = [("method", method.to_string()), ("path", path.to_string())];
        histogram!("http_request_duration_seconds", &duration_labels).record(duration);
    }

    /// Record a credential fetch outcome with timing
    pub fn record_secret_fetch(&self, source: &str, success: bool, duration: f64) {
        let status = if success { "success" } else { "error" };
        let labels = [("source", source.to_string()), ("status", status.to_string())];
        counter!("secret_fetches_total", &labels).increment(1);

        let duration_labels = [("source", source.to_string())];
        histogram!("secret_fetch_duration_seconds", &duration_labels).record(duration);
    }

    /// Record a completed secret refresh
    pub fn record_secret_refresh(&self, source: &str) {
        let labels = [("source", source.to_string())];
        counter!("secret_refreshes_total", &labels).increment(1);
    }

    /// Update database pool connection gauges
    pub fn update_pool_connections(&self, size: u32, idle: usize) {
        gauge!("db_pool_connections", "state" => "total").set(size as f64);
        gauge!("db_pool_connections", "state" => "idle").set(idle as f64);
        gauge!("db_pool_connections", "state" => "active")
            .set(size.saturating_sub(idle as u32) as f64);
    }
}

/// Axum middleware recording request count and latency for every response
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    MetricsRecorder::new().record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_idempotent() {
        let first = init_metrics().unwrap();
        let second = init_metrics().unwrap();
        // Both handles render from the same recorder
        first.render();
        second.render();
    }

    #[test]
    fn test_recorder_accepts_events() {
        init_metrics().unwrap();
        let recorder = MetricsRecorder::new();
        recorder.record_http_request("GET", "/health", 200, 0.001);
        recorder.record_secret_fetch("env", true, 0.002);
        recorder.record_secret_refresh("env");
        recorder.update_pool_connections(10, 4);

        let rendered = init_metrics().unwrap().render();
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("secret_fetches_total"));
    }
}
