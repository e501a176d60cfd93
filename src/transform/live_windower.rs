//! Live Windower: projects a VOD source onto a simulated live sliding
//! window driven by wall-clock time. This is the system's core novel
//! engineering — see spec §4.4 for the full algorithm.

use crate::error::Result;
use crate::playlist::{Playlist, Segment, Tag};

/// Default window size in segments when the caller doesn't specify one.
pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// The cumulative source-timeline time (seconds) at which the `media_sequence`-th
/// segment begins, given the unwindowed source segments. Used by the Ad Break
/// Injector's `startOffset` for a live window (spec §4.5).
pub fn source_timeline_offset(source: &[Segment], media_sequence: u64) -> f64 {
    let len = source.len();
    if len == 0 {
        return 0.0;
    }
    (0..media_sequence)
        .map(|i| source[(i as usize) % len].duration)
        .sum()
}

/// Produce a live media playlist from `playlist`'s segments.
///
/// `start_ms`/`now_ms` are wall-clock epoch milliseconds; `window_size` is
/// the requested number of segments in the sliding window (clamped to the
/// source length).
pub fn window(mut playlist: Playlist, start_ms: i64, now_ms: i64, window_size: usize) -> Result<Playlist> {
    let source = playlist.segments().to_vec();
    let len = source.len();

    if len == 0 {
        finalize(&mut playlist, 0, 0, 0);
        *playlist.segments_mut()? = Vec::new();
        return Ok(playlist);
    }

    let effective_window = window_size.min(len);
    if effective_window == 0 {
        finalize(&mut playlist, 0, 0, 0);
        *playlist.segments_mut()? = Vec::new();
        return Ok(playlist);
    }
    let mut win: Vec<_> = source[0..effective_window].to_vec();

    let mut media_sequence: u64 = 0;
    let mut discontinuity_sequence: u64 = 0;
    let mut next_tail_index = effective_window;
    let mut elapsed = (now_ms - start_ms) as f64 / 1000.0;

    while elapsed > win[0].duration {
        let idx = next_tail_index % len;
        let mut new_seg = source[idx].clone();
        if idx == 0 {
            new_seg.discontinuity = true;
            new_seg.tags.insert(0, Tag::bare("EXT-X-DISCONTINUITY"));
        }
        win.push(new_seg);

        let head = win.remove(0);
        if head.discontinuity {
            discontinuity_sequence += 1;
        }
        elapsed -= head.duration;
        media_sequence += 1;
        next_tail_index += 1;
    }

    *playlist.segments_mut()? = win;
    let max_duration = playlist
        .segments()
        .iter()
        .map(|s| s.duration)
        .fold(0.0_f64, f64::max);
    finalize(
        &mut playlist,
        max_duration.ceil() as u64,
        media_sequence,
        discontinuity_sequence,
    );
    Ok(playlist)
}

fn finalize(playlist: &mut Playlist, target_duration: u64, media_sequence: u64, discontinuity_sequence: u64) {
    playlist.set_tag_value("EXT-X-TARGETDURATION", target_duration.to_string());
    playlist.set_tag_value("EXT-X-MEDIA-SEQUENCE", media_sequence.to_string());
    playlist.set_tag_value("EXT-X-DISCONTINUITY-SEQUENCE", discontinuity_sequence.to_string());
    playlist.set_tag_value("EXT-X-START", "TIME-OFFSET=0.0");
    playlist.remove_tag("EXT-X-PLAYLIST-TYPE");
    playlist.remove_tag("EXT-X-ENDLIST");
}
