//! `GET /vod.m3u8` (spec §6): serves a looped/truncated VOD playlist, or a
//! master-playlist rewrite when `variant` is omitted.

use super::common::{
    fetch_master, fetch_variant, parse_f64, parse_usize, playlist_response, resolve_default_stream,
    resolve_stream_url, select_variant_uri,
};
use crate::error::Result;
use crate::playlist::encoder;
use crate::server::state::AppState;
use crate::transform::{ad_injector, master_rewriter, vod_fitter};
use axum::extract::{Query, State};
use axum::response::Response;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

pub async fn serve_vod(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Response> {
    let started = Instant::now();
    let outcome = handle(&params, &state).await;

    crate::metrics::record_request("vod", if outcome.is_ok() { "200" } else { "500" });
    crate::metrics::record_transform_duration(started.elapsed());

    outcome
}

async fn handle(params: &HashMap<String, String>, state: &AppState) -> Result<Response> {
    let requested_stream = params.get("stream").cloned();
    let stream = requested_stream
        .clone()
        .unwrap_or_else(|| state.config.default_stream.clone());
    info!(stream = %stream, "serving /vod.m3u8");

    let master_url = match requested_stream {
        Some(ref s) => resolve_stream_url(s)?,
        None => resolve_default_stream(&stream)?,
    };
    let master = fetch_master(state, &master_url).await?;

    let variant = params
        .get("variant")
        .map(|v| parse_usize(v, "variant"))
        .transpose()?;
    let duration = params
        .get("duration")
        .map(|d| parse_f64(d, "duration"))
        .transpose()?;
    let ad = params.get("ad").map(String::as_str);

    let encoded = match variant {
        None => {
            let rewrite_params = master_rewriter::RewriteParams {
                mode: "vod",
                stream: &stream,
                start: None,
                duration,
                ad,
            };
            encoder::encode(&master_rewriter::rewrite(master, &rewrite_params))
        }
        Some(index) => {
            let variant_uri = select_variant_uri(&master, index)?;
            let variant_playlist = fetch_variant(state, &master_url, index, &variant_uri).await?;

            let mut fitted = vod_fitter::fit(variant_playlist, duration)?;
            if let Some(raw) = ad {
                let config = ad_injector::parse_ad_param(raw)?;
                fitted = ad_injector::inject(fitted, &config, 0.0)?;
            }
            encoder::encode(&fitted)
        }
    };

    Ok(playlist_response(encoded))
}
