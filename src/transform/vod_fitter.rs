//! VOD Fitter: loop a VOD media playlist's segments to meet a target total
//! duration, inserting a discontinuity at every loop wrap.

use crate::error::Result;
use crate::playlist::{Playlist, Tag};

/// Fit `playlist` to an optional target duration `target_seconds`.
///
/// If the source has no segments, or no target is given, the playlist is
/// returned unchanged except for the finalization tags (target duration,
/// `EXT-X-PLAYLIST-TYPE:VOD`, `EXT-X-ENDLIST`). Fails only if `playlist` is
/// a master playlist, which callers are expected to have already excluded.
pub fn fit(mut playlist: Playlist, target_seconds: Option<f64>) -> Result<Playlist> {
    let source = playlist.segments().to_vec();

    if !source.is_empty() {
        if let Some(target) = target_seconds {
            let len = source.len();
            let mut built = Vec::new();
            let mut accumulated = 0.0;
            let mut i = 0usize;
            while accumulated < target {
                let mut segment = source[i % len].clone();
                if i >= len && i % len == 0 {
                    segment.discontinuity = true;
                    segment.tags.insert(0, Tag::bare("EXT-X-DISCONTINUITY"));
                }
                accumulated += segment.duration;
                built.push(segment);
                i += 1;
            }
            *playlist.segments_mut()? = built;
        }
    }

    finalize(&mut playlist);
    Ok(playlist)
}

fn finalize(playlist: &mut Playlist) {
    let max_duration = playlist
        .segments()
        .iter()
        .map(|s| s.duration)
        .fold(0.0_f64, f64::max);
    let target_duration = max_duration.ceil() as u64;

    playlist.set_tag_value("EXT-X-TARGETDURATION", target_duration.to_string());
    playlist.set_tag_value("EXT-X-PLAYLIST-TYPE", "VOD");
    playlist.ensure_bare_tag("EXT-X-ENDLIST");
}
