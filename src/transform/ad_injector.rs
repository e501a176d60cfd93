//! Ad Break Injector: overlays SCTE-35-style cue tags onto an already
//! windowed or fitted segment list, per an [`AdConfig`] schedule.

use crate::error::{GatewayError, Result};
use crate::playlist::{AdConfig, Playlist, Tag};
use chrono::{NaiveTime, Timelike};

/// Epsilon for boundary-robust break-start matching (spec §4.5).
const EPSILON: f64 = 0.001;

/// Parse the `ad` query parameter grammar (spec §6):
/// `interval,<duration_s>,<interval_s>` or
/// `ts,<duration_s>,<HH:MM:SS>[,<HH:MM:SS>...]`.
pub fn parse_ad_param(raw: &str) -> Result<AdConfig> {
    let mut parts = raw.split(',');
    let mode = parts
        .next()
        .ok_or_else(|| GatewayError::AdConfig("empty ad parameter".to_string()))?;

    match mode {
        "interval" => {
            let duration: f64 = parts
                .next()
                .ok_or_else(|| GatewayError::AdConfig("missing duration".to_string()))?
                .parse()?;
            let interval: f64 = parts
                .next()
                .ok_or_else(|| GatewayError::AdConfig("missing interval".to_string()))?
                .parse()?;
            if duration <= 0.0 {
                return Err(GatewayError::AdConfig("duration must be > 0".to_string()));
            }
            if interval <= 0.0 {
                return Err(GatewayError::AdConfig("interval must be > 0".to_string()));
            }
            Ok(AdConfig::Interval { duration, interval })
        }
        "ts" => {
            let duration: f64 = parts
                .next()
                .ok_or_else(|| GatewayError::AdConfig("missing duration".to_string()))?
                .parse()?;
            if duration <= 0.0 {
                return Err(GatewayError::AdConfig("duration must be > 0".to_string()));
            }
            let mut starts: Vec<f64> = parts
                .map(|ts| parse_hms(ts))
                .collect::<Result<_>>()?;
            if starts.is_empty() {
                return Err(GatewayError::AdConfig(
                    "timestamp mode requires at least one timestamp".to_string(),
                ));
            }
            starts.sort_by(|a, b| a.partial_cmp(b).unwrap());
            Ok(AdConfig::Timestamps { duration, starts })
        }
        other => Err(GatewayError::AdConfig(format!("unknown ad mode: {other}"))),
    }
}

fn parse_hms(raw: &str) -> Result<f64> {
    let time = NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .map_err(|_| GatewayError::AdConfig(format!("malformed timestamp: {raw}")))?;
    Ok(time.num_seconds_from_midnight() as f64)
}

/// Insert cue tags into `playlist`'s segments in place, given `start_offset`
/// — the absolute playback time (seconds) of the first segment.
pub fn inject(mut playlist: Playlist, config: &AdConfig, start_offset: f64) -> Result<Playlist> {
    let breaks = break_starts(config, start_offset, total_duration(&playlist, start_offset));
    if breaks.is_empty() {
        return Ok(playlist);
    }

    let duration = config.duration();
    let mut current_time = start_offset;
    let mut prev_in_ad = false;

    for segment in playlist.segments_mut()?.iter_mut() {
        let seg_start = current_time;
        let matching_break = breaks
            .iter()
            .find(|&&b| seg_start >= b - EPSILON && seg_start < b + duration);

        if let Some(&break_start) = matching_break {
            let elapsed = seg_start - break_start;
            if elapsed < EPSILON {
                let value = format_duration(duration);
                segment
                    .tags
                    .insert(0, Tag::with_value("EXT-X-CUE-OUT", value));
            } else {
                let value = format!("{:.1}/{}", elapsed, format_duration(duration));
                segment
                    .tags
                    .insert(0, Tag::with_value("EXT-X-CUE-OUT-CONT", value));
            }
            prev_in_ad = true;
        } else if prev_in_ad {
            segment.tags.insert(0, Tag::bare("EXT-X-CUE-IN"));
            prev_in_ad = false;
        }

        current_time += segment.duration;
    }

    Ok(playlist)
}

fn total_duration(playlist: &Playlist, start_offset: f64) -> f64 {
    start_offset + playlist.segments().iter().map(|s| s.duration).sum::<f64>()
}

/// Compute candidate break-start times that intersect the window span.
fn break_starts(config: &AdConfig, start_offset: f64, window_end: f64) -> Vec<f64> {
    match config {
        AdConfig::Interval { duration, interval } => {
            let mut starts = Vec::new();
            let mut n = 1;
            loop {
                let start = *interval * n as f64;
                if start >= window_end {
                    break;
                }
                if start + duration > start_offset {
                    starts.push(start);
                }
                n += 1;
            }
            starts
        }
        AdConfig::Timestamps { duration, starts } => starts
            .iter()
            .copied()
            .filter(|&s| s < window_end && s + duration > start_offset)
            .collect(),
    }
}

/// Integer-formatted when integral, else as-provided with trailing zeros
/// trimmed (spec §4.5: "integer-formatted when integral, else as
/// provided").
fn format_duration(duration: f64) -> String {
    if duration.fract() == 0.0 {
        format!("{}", duration as i64)
    } else {
        duration.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::{Body, Kind, Segment};

    fn media_playlist(durations: &[f64]) -> Playlist {
        Playlist {
            kind: Kind::Media,
            version: None,
            tags: Vec::new(),
            body: Body::Media(
                durations
                    .iter()
                    .enumerate()
                    .map(|(i, d)| Segment::new(*d, format!("seg{i}.ts")))
                    .collect(),
            ),
            source_url: "https://example.com/index.m3u8".to_string(),
        }
    }

    fn cue_tag(segment: &Segment) -> Option<&Tag> {
        segment
            .tags
            .iter()
            .find(|t| t.name.starts_with("EXT-X-CUE"))
    }

    #[test]
    fn interval_injection_scenario() {
        // Scenario 6: 6x10s segments, ad=interval,15,30.
        // Segment 3 (t=30): CUE-OUT:15. Segment 4 (t=40): CUE-OUT-CONT:10.0/15.
        // Segment 5 (t=50): CUE-IN.
        let playlist = media_playlist(&[10.0; 6]);
        let config = AdConfig::Interval {
            duration: 15.0,
            interval: 30.0,
        };
        let injected = inject(playlist, &config, 0.0).unwrap();
        let segs = injected.segments();
        assert_eq!(
            cue_tag(&segs[3]).unwrap().raw_line,
            "#EXT-X-CUE-OUT:15"
        );
        assert_eq!(
            cue_tag(&segs[4]).unwrap().raw_line,
            "#EXT-X-CUE-OUT-CONT:10.0/15"
        );
        assert_eq!(cue_tag(&segs[5]).unwrap().name, "EXT-X-CUE-IN");
        assert!(cue_tag(&segs[0]).is_none());
        assert!(cue_tag(&segs[1]).is_none());
        assert!(cue_tag(&segs[2]).is_none());
    }

    #[test]
    fn timestamp_injection_live_scenario() {
        // Scenario 7: 5 segments, ad=ts,5,00:00:10; window s0,s1,s2 with
        // startOffset=0. s1 CUE-OUT:5, s2 CUE-IN.
        let playlist = media_playlist(&[10.0, 10.0, 10.0]);
        let config = AdConfig::Timestamps {
            duration: 5.0,
            starts: vec![10.0],
        };
        let injected = inject(playlist, &config, 0.0).unwrap();
        let segs = injected.segments();
        assert!(cue_tag(&segs[0]).is_none());
        assert_eq!(cue_tag(&segs[1]).unwrap().raw_line, "#EXT-X-CUE-OUT:5");
        assert_eq!(cue_tag(&segs[2]).unwrap().name, "EXT-X-CUE-IN");
    }

    #[test]
    fn no_intersecting_breaks_leaves_tags_unchanged() {
        let playlist = media_playlist(&[10.0, 10.0]);
        let config = AdConfig::Timestamps {
            duration: 5.0,
            starts: vec![10_000.0],
        };
        let injected = inject(playlist.clone(), &config, 0.0).unwrap();
        assert_eq!(injected, playlist);
    }

    #[test]
    fn empty_segment_list_is_idempotent() {
        let playlist = media_playlist(&[]);
        let config = AdConfig::Interval {
            duration: 10.0,
            interval: 30.0,
        };
        let injected = inject(playlist.clone(), &config, 0.0).unwrap();
        assert_eq!(injected, playlist);
    }

    #[test]
    fn interval_breaks_never_start_at_zero() {
        let playlist = media_playlist(&[10.0, 10.0, 10.0]);
        let config = AdConfig::Interval {
            duration: 5.0,
            interval: 30.0,
        };
        let injected = inject(playlist, &config, 0.0).unwrap();
        assert!(cue_tag(&injected.segments()[0]).is_none());
    }

    #[test]
    fn cue_tags_are_prepended_not_appended() {
        let playlist = media_playlist(&[10.0, 10.0, 10.0, 10.0]);
        let config = AdConfig::Interval {
            duration: 5.0,
            interval: 10.0,
        };
        let injected = inject(playlist, &config, 0.0).unwrap();
        let seg = &injected.segments()[1];
        assert_eq!(seg.tags[0].name, "EXT-X-CUE-OUT");
        assert_eq!(seg.tags[1].name, "EXTINF");
    }

    // ---- parse_ad_param ----

    #[test]
    fn parses_interval_mode() {
        let config = parse_ad_param("interval,15,30").unwrap();
        assert_eq!(
            config,
            AdConfig::Interval {
                duration: 15.0,
                interval: 30.0
            }
        );
    }

    #[test]
    fn parses_timestamp_mode_with_multiple_entries() {
        let config = parse_ad_param("ts,5,00:00:10,00:01:30").unwrap();
        assert_eq!(
            config,
            AdConfig::Timestamps {
                duration: 5.0,
                starts: vec![10.0, 90.0],
            }
        );
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let err = parse_ad_param("bogus,1,2").unwrap_err();
        assert!(matches!(err, GatewayError::AdConfig(_)));
    }

    #[test]
    fn timestamp_mode_requires_at_least_one_timestamp() {
        let err = parse_ad_param("ts,5").unwrap_err();
        assert!(matches!(err, GatewayError::AdConfig(_)));
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let err = parse_ad_param("ts,5,not-a-time").unwrap_err();
        assert!(matches!(err, GatewayError::AdConfig(_)));
    }

    #[test]
    fn interval_mode_requires_positive_duration_and_interval() {
        assert!(parse_ad_param("interval,0,30").is_err());
        assert!(parse_ad_param("interval,15,0").is_err());
    }
}
