//! `GET /metrics` — Prometheus scrape endpoint (spec §10.5, additive to the
//! playlist endpoints named in §6).

use crate::server::state::AppState;
use axum::extract::State;

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}
