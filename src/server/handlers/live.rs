//! `GET /live.m3u8` (spec §6): serves a simulated live sliding-window
//! playlist, or a master-playlist rewrite when `variant` is omitted.

use super::common::{
    fetch_master, fetch_variant, now_ms, parse_i64, parse_usize, playlist_response,
    resolve_default_stream, resolve_stream_url, select_variant_uri,
};
use crate::error::Result;
use crate::playlist::encoder;
use crate::server::state::AppState;
use crate::transform::{ad_injector, live_windower, master_rewriter};
use axum::extract::{Query, State};
use axum::response::Response;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

pub async fn serve_live(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Response> {
    let started = Instant::now();
    let outcome = handle(&params, &state).await;

    crate::metrics::record_request("live", if outcome.is_ok() { "200" } else { "500" });
    crate::metrics::record_transform_duration(started.elapsed());

    outcome
}

async fn handle(params: &HashMap<String, String>, state: &AppState) -> Result<Response> {
    let requested_stream = params.get("stream").cloned();
    let stream = requested_stream
        .clone()
        .unwrap_or_else(|| state.config.default_stream.clone());
    info!(stream = %stream, "serving /live.m3u8");

    let master_url = match requested_stream {
        Some(ref s) => resolve_stream_url(s)?,
        None => resolve_default_stream(&stream)?,
    };
    let master = fetch_master(state, &master_url).await?;

    let variant = params
        .get("variant")
        .map(|v| parse_usize(v, "variant"))
        .transpose()?;
    let start = params
        .get("start")
        .map(|s| parse_i64(s, "start"))
        .transpose()?
        .unwrap_or_else(now_ms);
    let now = params
        .get("now")
        .map(|n| parse_i64(n, "now"))
        .transpose()?
        .unwrap_or_else(now_ms);
    let window_size = params
        .get("windowSize")
        .map(|w| parse_usize(w, "windowSize"))
        .transpose()?
        .unwrap_or(live_windower::DEFAULT_WINDOW_SIZE);
    let ad = params.get("ad").map(String::as_str);

    let encoded = match variant {
        None => {
            let rewrite_params = master_rewriter::RewriteParams {
                mode: "live",
                stream: &stream,
                start: Some(start),
                duration: None,
                ad,
            };
            encoder::encode(&master_rewriter::rewrite(master, &rewrite_params))
        }
        Some(index) => {
            let variant_uri = select_variant_uri(&master, index)?;
            let variant_playlist = fetch_variant(state, &master_url, index, &variant_uri).await?;
            let source_segments = variant_playlist.segments().to_vec();

            let mut windowed = live_windower::window(variant_playlist, start, now, window_size)?;
            if let Some(raw) = ad {
                let media_sequence = windowed
                    .tag("EXT-X-MEDIA-SEQUENCE")
                    .and_then(|t| t.value.as_ref())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                let offset = live_windower::source_timeline_offset(&source_segments, media_sequence);
                let config = ad_injector::parse_ad_param(raw)?;
                windowed = ad_injector::inject(windowed, &config, offset)?;
            }
            encoder::encode(&windowed)
        }
    };

    Ok(playlist_response(encoded))
}
