//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relays by method and outcome
//! - `relay_request_duration_seconds` (histogram): end-to-end latency by outcome
//! - `relay_redirects_total` (counter): redirect hops followed
//! - `relay_rejected_total` (counter): inbound requests failing validation
//!
//! Recording is a no-op until [`init_metrics`] installs an exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_relay(method: &'static str, outcome: &'static str, start: Instant) {
    ::metrics::counter!("relay_requests_total", "method" => method, "outcome" => outcome)
        .increment(1);
    ::metrics::histogram!("relay_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_redirects(hops: usize) {
    ::metrics::counter!("relay_redirects_total").increment(hops as u64);
}

pub fn record_rejected() {
    ::metrics::counter!("relay_rejected_total").increment(1);
}
