//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_rate_limited_total` (counter): rejections by policy
//! - `gateway_origin_rejected_total` (counter): cross-origin denials
//! - `gateway_proxy_failures_total` (counter): backend failures by transport mode
//! - `gateway_uploads_total` / `gateway_upload_bytes`: stored images
//!
//! Recording is a no-op until a recorder is installed, so handlers call
//! these unconditionally.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(policy: &'static str) {
    counter!("gateway_rate_limited_total", "policy" => policy).increment(1);
}

pub fn record_origin_rejected() {
    counter!("gateway_origin_rejected_total").increment(1);
}

pub fn record_proxy_failure(mode: &'static str) {
    counter!("gateway_proxy_failures_total", "mode" => mode).increment(1);
}

pub fn record_upload(size: usize) {
    counter!("gateway_uploads_total").increment(1);
    counter!("gateway_upload_bytes").increment(size as u64);
}
