//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_redirects_total` (counter): path-to-subdomain redirects by
//!   namespace
//! - `gateway_passthrough_total` (counter): passthrough responses by
//!   status class
//! - `gateway_upstream_duration_seconds` (histogram): passthrough latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(err) => tracing::error!(error = %err, "failed to install metrics exporter"),
    }
}

/// Record one path-to-subdomain redirect.
pub fn record_redirect(namespace: &str) {
    metrics::counter!("gateway_redirects_total", "namespace" => namespace.to_string())
        .increment(1);
}

/// Record one passthrough response.
pub fn record_passthrough(status: u16, start: Instant) {
    let class = match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    };
    metrics::counter!("gateway_passthrough_total", "class" => class).increment(1);
    metrics::histogram!("gateway_upstream_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
