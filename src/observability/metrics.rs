//! Metrics collection and exposition.
//!
//! # Metrics
//! - `saver_requests_total` (counter): requests by method, status
//! - `saver_request_duration_seconds` (histogram): handler latency
//! - `saver_rate_limited_total` (counter): rejected by the rate limiter
//! - `saver_commit_attempts_total` (counter): write outcomes by kind
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("saver_requests_total", &labels).increment(1);
    metrics::histogram!("saver_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("saver_rate_limited_total").increment(1);
}

pub fn record_commit_attempt(outcome: &'static str) {
    metrics::counter!("saver_commit_attempts_total", "outcome" => outcome).increment(1);
}
