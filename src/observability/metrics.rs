//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_fetch_total` (counter): consensus fetches by chain and result
//! - `relay_fetch_duration_seconds` (histogram): consensus fetch latency by chain
//! - `relay_consensus_rounds_total` (counter): votes by level and verdict
//! - `relay_transport_failures_total` (counter): failed exchanges by connection kind and error
//! - `relay_point_attempts_total` (counter): point reads by result
//!
//! # Design Decisions
//! - No circuit or endpoint labels; metrics stay on the safe side of the anonymity boundary
//! - Recording is a no-op until a recorder is installed

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::chain::ChainId;
use crate::fetch::FetchError;
use crate::transport::TransportError;

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the end of a consensus fetch.
pub fn record_fetch(chain_id: ChainId, result: Result<(), &FetchError>, start: Instant) {
    let chain = chain_id.to_string();
    let result = match result {
        Ok(()) => "trusted",
        Err(e) => e.label(),
    };
    metrics::counter!("relay_fetch_total", "chain" => chain.clone(), "result" => result).increment(1);
    metrics::histogram!("relay_fetch_duration_seconds", "chain" => chain)
        .record(start.elapsed().as_secs_f64());
}

/// Record one consensus vote at `level` ("circuit" or "chain").
pub fn record_consensus_round(level: &'static str, verdict: Result<(), &FetchError>) {
    let verdict = match verdict {
        Ok(()) => "trusted",
        Err(e) => e.label(),
    };
    metrics::counter!("relay_consensus_rounds_total", "level" => level, "verdict" => verdict).increment(1);
}

/// Record a failed exchange.
pub fn record_transport_failure(kind: &'static str, error: &TransportError) {
    let error = match error {
        TransportError::Network(_) => "network",
        TransportError::Status(_) => "status",
        TransportError::Timeout(_) => "timeout",
        TransportError::Malformed(_) => "malformed",
        TransportError::Rpc { .. } => "rpc",
        TransportError::Closed => "closed",
        TransportError::Cancelled => "cancelled",
    };
    metrics::counter!("relay_transport_failures_total", "kind" => kind, "error" => error).increment(1);
}

/// Record the end of a point read.
pub fn record_point_read(result: Result<(), &FetchError>) {
    let result = match result {
        Ok(()) => "success",
        Err(e) => e.label(),
    };
    metrics::counter!("relay_point_attempts_total", "result" => result).increment(1);
}
