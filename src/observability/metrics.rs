//! Metrics collection and exposition.
//!
//! # Metrics
//! - `claim_submissions_total` (counter): submissions by outcome
//! - `claim_transitions_total` (counter): accepted status changes by resulting status
//! - `claim_poll_errors_total` (counter): failed lookups by source and kind
//! - `claim_inflight_transactions` (gauge, `event_key`): non-terminal transactions seen by the event's last tick
//! - `claim_store_size` (gauge): records held by the transaction store

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submission(outcome: &'static str) {
    metrics::counter!("claim_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_transition(status: &'static str) {
    metrics::counter!("claim_transitions_total", "status" => status).increment(1);
}

pub fn record_poll_error(source: &'static str, kind: &'static str) {
    metrics::counter!("claim_poll_errors_total", "source" => source, "kind" => kind).increment(1);
}

pub fn record_inflight(event_key: &str, count: usize) {
    metrics::gauge!("claim_inflight_transactions", "event_key" => event_key.to_string())
        .set(count as f64);
}

pub fn record_store_size(size: usize) {
    metrics::gauge!("claim_store_size").set(size as f64);
}
