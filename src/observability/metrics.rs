//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mint_attempts_total` (counter): mint submissions by outcome
//! - `mint_tokens_total` (counter): tokens minted
//! - `tezos_rpc_requests_total` (counter): node calls by endpoint, outcome
//! - `tezos_node_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one Tezos node call.
pub fn record_rpc(endpoint: &'static str, outcome: &'static str) {
    counter!("tezos_rpc_requests_total", "endpoint" => endpoint, "outcome" => outcome).increment(1);
}

pub fn record_node_health(healthy: bool) {
    gauge!("tezos_node_healthy").set(if healthy { 1.0 } else { 0.0 });
}

/// Record a mint attempt; `tokens` is zero unless it succeeded.
pub fn record_mint(outcome: &'static str, tokens: u64) {
    counter!("mint_attempts_total", "outcome" => outcome).increment(1);
    if tokens > 0 {
        counter!("mint_tokens_total").increment(tokens);
    }
}

/// Record a served HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}
