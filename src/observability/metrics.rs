//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by method, status
//! - `gate_request_duration_seconds` (histogram): latency distribution
//! - `gate_decisions_total` (counter): gate outcomes by category, action
//! - `gate_upstream_errors_total` (counter): forwarding failures by kind
//! - `gate_config_reloads_total` (counter): reload attempts by outcome
//!
//! Recording is a no-op until a recorder is installed, so tests and the CLI
//! never need an exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gate_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_gate_decision(category: &'static str, action: &'static str) {
    metrics::counter!("gate_decisions_total", "category" => category, "action" => action)
        .increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("gate_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_config_reload(success: bool) {
    let outcome = if success { "applied" } else { "rejected" };
    metrics::counter!("gate_config_reloads_total", "outcome" => outcome).increment(1);
}
