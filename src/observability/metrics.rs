//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lambda_invocations_total` (counter): requests by function, status
//! - `lambda_invocation_duration_seconds` (histogram): latency by function

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished invocation.
pub fn record_invocation(function: &str, status: u16, start: Instant) {
    let function = function.to_string();
    counter!(
        "lambda_invocations_total",
        "function" => function.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("lambda_invocation_duration_seconds", "function" => function)
        .record(start.elapsed().as_secs_f64());
}
