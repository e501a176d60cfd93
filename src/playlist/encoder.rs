//! Serializes a [`Playlist`] back to HLS text, using each tag's preserved
//! (or freshly regenerated) raw line.

use super::{Body, Playlist};

/// Encode a playlist to its textual HLS form. Lines are joined with `\n`.
pub fn encode(playlist: &Playlist) -> String {
    let mut lines = vec!["#EXTM3U".to_string()];

    if let Some(version) = playlist.version {
        lines.push(format!("#EXT-X-VERSION:{version}"));
    }

    for tag in &playlist.tags {
        lines.push(tag.raw_line.clone());
    }

    match &playlist.body {
        Body::Media(segments) => {
            for segment in segments {
                for tag in &segment.tags {
                    lines.push(tag.raw_line.clone());
                }
                lines.push(segment.uri.clone());
            }
        }
        Body::Master { variants, media } => {
            for rendition in media {
                lines.push(rendition.tag.raw_line.clone());
            }
            for variant in variants {
                for tag in &variant.tags {
                    lines.push(tag.raw_line.clone());
                }
                lines.push(variant.uri.clone());
            }
        }
    }

    lines.join("\n")
}
