//! HTTP surface: router assembly and shared request state.

pub mod handlers;
pub mod state;
pub mod url_validation;

use crate::config::Config;
use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use state::AppState;
use tower_http::cors::CorsLayer;

/// Build the Axum router for a given configuration. Exposed separately from
/// `start` so tests can drive it directly via `tower::ServiceExt::oneshot`
/// without binding a TCP listener.
pub async fn build_router(config: Config) -> Router {
    let state = AppState::new(config);
    build_router_with_state(state)
}

pub fn build_router_with_state(state: AppState) -> Router {
    // Spec §6: permissive CORS on every response.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::RANGE])
        .expose_headers([header::CONTENT_LENGTH, header::CONTENT_RANGE]);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/vod.m3u8", get(handlers::vod::serve_vod))
        .route("/live.m3u8", get(handlers::live::serve_live))
        .layer(cors)
        .with_state(state)
}

/// Bind a listener and serve forever.
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let app = build_router(config).await;

    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
