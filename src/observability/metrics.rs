//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatehouse_calls_total` (counter): calls by method, status
//! - `gatehouse_call_duration_seconds` (histogram): latency by method
//! - `gatehouse_rate_limited_total` (counter): calls denied by the limiter
//! - `gatehouse_auth_failures_total` (counter): rejected credentials by reason
//! - `gatehouse_revoked_tokens` (gauge): entries held by the revocation store
//!
//! Recording is a no-op until a recorder is installed, so tests and library
//! users pay nothing unless `init_metrics` runs.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_call(method: &str, status: &str, duration: Duration) {
    counter!(
        "gatehouse_calls_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gatehouse_call_duration_seconds", "method" => method.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("gatehouse_rate_limited_total").increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    counter!("gatehouse_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_revoked_tokens(len: usize) {
    gauge!("gatehouse_revoked_tokens").set(len as f64);
}
