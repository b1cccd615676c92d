//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (transactions, phase latency, HTTP requests)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_transactions_total` (counter): by mode, function, outcome
//! - `gateway_transaction_duration_seconds` (histogram): by mode
//! - `gateway_phase_duration_seconds` (histogram): by phase, outcome
//! - `gateway_http_requests_total` (counter): by method, status
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed (tests, CLI)
//! - Outcome labels use `GatewayError::kind()` so they stay low-cardinality

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record one finished transaction.
pub fn record_transaction(
    mode: &'static str,
    function: &str,
    outcome: &'static str,
    start: Instant,
) {
    counter!(
        "gateway_transactions_total",
        "mode" => mode,
        "function" => function.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_transaction_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

/// Record the latency of a single ledger phase.
pub fn record_phase(phase: &'static str, outcome: &'static str, start: Instant) {
    histogram!(
        "gateway_phase_duration_seconds",
        "phase" => phase,
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an HTTP request served by the API.
pub fn record_request(method: &str, status: u16) {
    counter!(
        "gateway_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
