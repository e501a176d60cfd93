//! Process metrics (spec §10.5): a Prometheus exporter installed once at
//! startup and scraped via `GET /metrics`, additive to the three playlist
//! endpoints and never changing their behavior.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder, or return the already-installed
/// handle. Idempotent so it is safe to call from every test that builds a
/// router in the same process.
pub fn install() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus metrics recorder")
        })
        .clone()
}

/// Record the outcome of a gateway request.
pub fn record_request(endpoint: &'static str, outcome: &'static str) {
    metrics::counter!("gateway_requests_total", "endpoint" => endpoint, "outcome" => outcome)
        .increment(1);
}

/// Record how long an upstream fetch took.
pub fn record_fetch_duration(elapsed: Duration) {
    metrics::histogram!("gateway_upstream_fetch_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record how long a manifest transformation (parse through encode) took.
pub fn record_transform_duration(elapsed: Duration) {
    metrics::histogram!("gateway_transform_duration_seconds").record(elapsed.as_secs_f64());
}
