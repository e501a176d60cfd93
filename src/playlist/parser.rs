//! Line-oriented HLS parser.
//!
//! Preserves every tag's raw input line so the encoder can re-emit tags
//! the engine does not interpret. See module doc on [`super::Tag`] for the
//! raw-line-sync invariant.

use super::{Body, Kind, MediaRendition, Playlist, Segment, Tag, Variant};
use crate::error::{GatewayError, Result};
use std::collections::HashMap;
use url::Url;

const PER_SEGMENT_TAGS: &[&str] = &[
    "EXT-X-DISCONTINUITY",
    "EXT-X-KEY",
    "EXT-X-MAP",
    "EXT-X-PROGRAM-DATE-TIME",
    "EXT-X-BYTERANGE",
    "EXT-X-DATERANGE",
];

/// Parse a text playlist body fetched from `source_url`.
///
/// Fails with [`GatewayError::Parse`] when the first non-empty line is not
/// `#EXTM3U`.
pub fn parse(text: &str, source_url: &str) -> Result<Playlist> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(first) if first == "#EXTM3U" => {}
        Some(other) => {
            return Err(GatewayError::Parse(format!(
                "expected #EXTM3U as first line, found: {other}"
            )))
        }
        None => return Err(GatewayError::Parse("empty playlist body".to_string())),
    }

    let mut kind = Kind::Media;
    let mut version = None;
    let mut playlist_tags: Vec<Tag> = Vec::new();
    let mut media_renditions: Vec<MediaRendition> = Vec::new();
    let mut variants: Vec<Variant> = Vec::new();
    let mut segments: Vec<Segment> = Vec::new();

    // Context buffers: per-segment decorators collected before the EXTINF
    // that opens the segment they belong to, or before the URI line that
    // closes a still-open segment/variant context.
    let mut pending_segment_tags: Vec<Tag> = Vec::new();
    let mut pending_variant_tags: Vec<Tag> = Vec::new();
    let mut open_extinf: Option<(f64, Option<String>, Tag)> = None;
    let mut open_variant: Option<(Vec<(String, String)>, Tag)> = None;

    for line in lines {
        if let Some(tail) = line.strip_prefix('#') {
            let (name, raw_tail) = split_tag(tail);

            match name.as_str() {
                "EXT-X-VERSION" => {
                    version = raw_tail.and_then(|v| v.parse::<u32>().ok());
                }
                "EXT-X-STREAM-INF" => {
                    kind = Kind::Master;
                    let attrs = parse_attributes(raw_tail.unwrap_or_default());
                    let tag = Tag::from_raw(name.clone(), None, line.to_string());
                    open_variant = Some((attrs, tag));
                }
                "EXTINF" => {
                    let tail = raw_tail.unwrap_or_default();
                    let (dur_str, title) = match tail.split_once(',') {
                        Some((d, t)) if !t.is_empty() => (d, Some(t.to_string())),
                        Some((d, _)) => (d, None),
                        None => (tail.as_str(), None),
                    };
                    let duration: f64 = dur_str.trim().parse().map_err(|_| {
                        GatewayError::Parse(format!("invalid EXTINF duration: {tail}"))
                    })?;
                    let tag = Tag::from_raw(name.clone(), Some(tail.clone()), line.to_string());
                    open_extinf = Some((duration, title, tag));
                }
                "EXT-X-MEDIA" => {
                    kind = Kind::Master;
                    let attrs = parse_attributes(raw_tail.unwrap_or_default());
                    let mut tag = Tag::from_raw(name.clone(), None, line.to_string());
                    tag.attributes = attrs;
                    media_renditions.push(MediaRendition { tag });
                }
                _ if PER_SEGMENT_TAGS.contains(&name.as_str()) => {
                    let tag = Tag::from_raw(name.clone(), raw_tail.clone(), line.to_string());
                    pending_segment_tags.push(tag);
                }
                _ => {
                    let tag = Tag::from_raw(name.clone(), raw_tail.clone(), line.to_string());
                    if open_variant.is_some() {
                        pending_variant_tags.push(tag);
                    } else if open_extinf.is_some() {
                        pending_segment_tags.push(tag);
                    } else {
                        playlist_tags.push(tag);
                    }
                }
            }
        } else {
            // URI line: closes whichever context is open.
            if let Some((attrs, stream_inf_tag)) = open_variant.take() {
                let bandwidth = attrs
                    .iter()
                    .find(|(k, _)| k == "BANDWIDTH")
                    .and_then(|(_, v)| v.parse::<u64>().ok())
                    .ok_or_else(|| {
                        GatewayError::Parse("EXT-X-STREAM-INF missing BANDWIDTH".to_string())
                    })?;
                let get = |key: &str| attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
                let mut tags: Vec<Tag> = std::mem::take(&mut pending_variant_tags);
                tags.insert(0, stream_inf_tag);
                variants.push(Variant {
                    uri: line.to_string(),
                    bandwidth,
                    average_bandwidth: get("AVERAGE-BANDWIDTH").and_then(|v| v.parse().ok()),
                    codecs: get("CODECS"),
                    resolution: get("RESOLUTION"),
                    frame_rate: get("FRAME-RATE"),
                    attributes: attrs,
                    tags,
                });
            } else if let Some((duration, title, extinf_tag)) = open_extinf.take() {
                let resolved = resolve(source_url, line);
                let mut tags: Vec<Tag> = std::mem::take(&mut pending_segment_tags);
                tags.push(extinf_tag);
                let mut segment = Segment {
                    duration,
                    title,
                    uri: resolved,
                    byte_range: None,
                    discontinuity: false,
                    key: None,
                    map: None,
                    program_date_time: None,
                    date_range: None,
                    tags: Vec::new(),
                };
                for tag in tags {
                    decorate_segment(&mut segment, &tag, source_url);
                    segment.tags.push(tag);
                }
                segments.push(segment);
            } else {
                return Err(GatewayError::Parse(format!(
                    "URI line with no open segment/variant context: {line}"
                )));
            }
        }
    }

    let body = if kind == Kind::Master {
        Body::Master {
            variants,
            media: media_renditions,
        }
    } else {
        Body::Media(segments)
    };

    Ok(Playlist {
        kind,
        version,
        tags: playlist_tags,
        body,
        source_url: source_url.to_string(),
    })
}

/// Decorate a segment from one of its preceding per-segment tags, and
/// resolve `EXT-X-MAP`'s `URI` attribute against the source URL.
fn decorate_segment(segment: &mut Segment, tag: &Tag, source_url: &str) {
    match tag.name.as_str() {
        "EXT-X-DISCONTINUITY" => segment.discontinuity = true,
        "EXT-X-KEY" => segment.key = Some(parse_attributes(tag.value.clone().unwrap_or_default())),
        "EXT-X-MAP" => {
            let mut attrs = parse_attributes(tag.value.clone().unwrap_or_default());
            for (k, v) in attrs.iter_mut() {
                if k == "URI" {
                    *v = resolve(source_url, v);
                }
            }
            segment.map = Some(attrs.into_iter().collect::<HashMap<_, _>>());
        }
        "EXT-X-PROGRAM-DATE-TIME" => segment.program_date_time = tag.value.clone(),
        "EXT-X-BYTERANGE" => segment.byte_range = tag.value.clone(),
        "EXT-X-DATERANGE" => {
            segment.date_range = Some(parse_attributes(tag.value.clone().unwrap_or_default()))
        }
        _ => {}
    }
}

/// Split a tag's tail into (name, tail-after-colon).
fn split_tag(tail: &str) -> (String, Option<String>) {
    match tail.split_once(':') {
        Some((name, rest)) => (name.to_string(), Some(rest.to_string())),
        None => (tail.to_string(), None),
    }
}

/// Parse a comma-separated `KEY=VALUE` attribute list. Commas inside double
/// quotes are literal; whitespace after a comma is skipped.
fn parse_attributes(tail: String) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let bytes = tail.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i] as char).is_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < bytes.len() && bytes[i] != b'=' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let key = tail[key_start..i].to_string();
        i += 1; // skip '='

        let value;
        if i < bytes.len() && bytes[i] == b'"' {
            i += 1;
            let val_start = i;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            value = tail[val_start..i].to_string();
            i += 1; // skip closing quote
        } else {
            let val_start = i;
            while i < bytes.len() && bytes[i] != b',' {
                i += 1;
            }
            value = tail[val_start..i].trim().to_string();
        }

        out.push((key, value));

        while i < bytes.len() && bytes[i] != b',' {
            i += 1;
        }
        if i < bytes.len() {
            i += 1; // skip comma
        }
    }
    out
}

/// Resolve a possibly-relative URI against a source URL. Falls back to the
/// literal URI if the source URL cannot be parsed (e.g. in unit tests that
/// use a bare path as the source).
fn resolve(source_url: &str, uri: &str) -> String {
    if let Ok(base) = Url::parse(source_url) {
        if let Ok(joined) = base.join(uri) {
            return joined.to_string();
        }
    }
    uri.to_string()
}
