//! `GET /health` — liveness probe. Always 200 with an empty body (spec §6).

use axum::http::StatusCode;

pub async fn health() -> StatusCode {
    StatusCode::OK
}
