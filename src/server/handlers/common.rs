//! Shared fetch → cache → select pipeline used by the `/vod.m3u8` and
//! `/live.m3u8` handlers (spec §4.7).

use crate::cache::ManifestCache;
use crate::error::{GatewayError, Result};
use crate::playlist::{parser, Kind, Playlist};
use crate::registry;
use crate::server::state::AppState;
use crate::server::url_validation::validate_origin_url;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::time::Instant;
use url::Url;

/// Wrap an encoded playlist body in the 200 response shape §6 requires.
/// CORS headers are applied globally by the router's `CorsLayer`.
pub fn playlist_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
        body,
    )
        .into_response()
}

/// Parse a required non-negative integer query parameter.
pub fn parse_usize(raw: &str, field: &str) -> Result<usize> {
    raw.parse()
        .map_err(|_| GatewayError::Internal(format!("invalid {field}: {raw}")))
}

/// Parse an optional floating-point query parameter.
pub fn parse_f64(raw: &str, field: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| GatewayError::Internal(format!("invalid {field}: {raw}")))
}

/// Parse an optional signed integer (epoch millisecond) query parameter.
pub fn parse_i64(raw: &str, field: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| GatewayError::Internal(format!("invalid {field}: {raw}")))
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Resolve a user-supplied `stream` query value to an absolute upstream
/// master URL: either a registry short name or a directly supplied
/// `http(s)://` URL (SSRF-validated, since this value is caller-controlled).
pub fn resolve_stream_url(stream: &str) -> Result<String> {
    if stream.starts_with("http://") || stream.starts_with("https://") {
        validate_origin_url(stream)?;
        Ok(stream.to_string())
    } else {
        registry::lookup(stream)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Internal(format!("unknown registry stream: {stream}")))
    }
}

/// Resolve the operator-configured default stream (`Config::default_stream`,
/// used when the `stream` query parameter is omitted). Registry short names
/// still go through the registry lookup, but an absolute URL here is
/// operator-trusted and skips the SSRF guard — it did not arrive from a
/// request.
pub fn resolve_default_stream(default_stream: &str) -> Result<String> {
    if default_stream.starts_with("http://") || default_stream.starts_with("https://") {
        Ok(default_stream.to_string())
    } else {
        registry::lookup(default_stream).map(str::to_string).ok_or_else(|| {
            GatewayError::Internal(format!("unknown registry stream: {default_stream}"))
        })
    }
}

/// Fetch (or serve from cache) the parsed master playlist at `master_url`.
pub async fn fetch_master(state: &AppState, master_url: &str) -> Result<Playlist> {
    let key = ManifestCache::key(master_url, "master");
    if let Some(playlist) = state.cache.get(&key) {
        return Ok(playlist);
    }

    let started = Instant::now();
    let body = state.fetcher.fetch(master_url).await?;
    crate::metrics::record_fetch_duration(started.elapsed());

    let playlist = parser::parse(&body, master_url)?;
    state.cache.insert(key, playlist.clone());
    Ok(playlist)
}

/// Select a variant (or `EXT-X-MEDIA` rendition) URI by index, walking
/// variants first then media renditions, per spec §4.6/§4.7.
pub fn select_variant_uri(master: &Playlist, index: usize) -> Result<String> {
    let variants = master.variants();
    if index < variants.len() {
        return Ok(variants[index].uri.clone());
    }
    let media_index = index - variants.len();
    master
        .media_renditions()
        .get(media_index)
        .and_then(|m| m.uri())
        .map(str::to_string)
        .ok_or_else(|| {
            GatewayError::VariantIndex(format!(
                "index {index} out of range ({} variants, {} media renditions)",
                variants.len(),
                master.media_renditions().len()
            ))
        })
}

/// Fetch (or serve from cache) the parsed variant media playlist, resolved
/// relative to the master's URL.
pub async fn fetch_variant(
    state: &AppState,
    master_url: &str,
    variant_index: usize,
    variant_uri: &str,
) -> Result<Playlist> {
    let key = ManifestCache::key(master_url, &variant_index.to_string());
    if let Some(playlist) = state.cache.get(&key) {
        return Ok(playlist);
    }

    let resolved = resolve_relative(master_url, variant_uri);

    let started = Instant::now();
    let body = state.fetcher.fetch(&resolved).await?;
    crate::metrics::record_fetch_duration(started.elapsed());

    let playlist = parser::parse(&body, &resolved)?;
    if playlist.kind != Kind::Media {
        return Err(GatewayError::Parse(format!(
            "expected a media playlist at {resolved}, found a master playlist"
        )));
    }
    state.cache.insert(key, playlist.clone());
    Ok(playlist)
}

fn resolve_relative(base: &str, uri: &str) -> String {
    if let Ok(base_url) = Url::parse(base) {
        if let Ok(joined) = base_url.join(uri) {
            return joined.to_string();
        }
    }
    uri.to_string()
}
