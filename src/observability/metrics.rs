//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ssrf_proxy_requests_total` (counter): requests by outcome and reason
//! - `ssrf_proxy_request_duration_seconds` (histogram): pipeline latency
//! - `ssrf_proxy_redirects_total` (counter): redirect hops followed
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing when metrics are disabled.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::pipeline::ProxyOutcome;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_outcome(outcome: &ProxyOutcome, start: Instant) {
    metrics::counter!(
        "ssrf_proxy_requests_total",
        "outcome" => outcome.kind(),
        "reason" => outcome.reason_code()
    )
    .increment(1);
    metrics::histogram!("ssrf_proxy_request_duration_seconds", "outcome" => outcome.kind())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_redirect() {
    metrics::counter!("ssrf_proxy_redirects_total").increment(1);
}
