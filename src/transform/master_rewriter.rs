//! Master Rewriter: replaces variant and `EXT-X-MEDIA` URIs in a master
//! playlist with self-referential URLs back into this gateway.

use crate::playlist::Playlist;

/// Parameters propagated onto every rewritten variant URL.
pub struct RewriteParams<'a> {
    pub mode: &'a str,
    pub stream: &'a str,
    pub start: Option<i64>,
    pub duration: Option<f64>,
    pub ad: Option<&'a str>,
}

/// Rewrite `playlist`'s variant and `EXT-X-MEDIA` URIs in place.
///
/// Indices are assigned by walking variants first, then media renditions,
/// in their original order (spec §4.6).
pub fn rewrite(mut playlist: Playlist, params: &RewriteParams) -> Playlist {
    let mut index = 0usize;

    if let crate::playlist::Body::Master { variants, media } = &mut playlist.body {
        for variant in variants.iter_mut() {
            variant.uri = build_url(params, index);
            index += 1;
        }
        for rendition in media.iter_mut() {
            // Renditions with no URI (muxed audio, CLOSED-CAPTIONS with only
            // an INSTREAM-ID) have nothing to rewrite; still advance `index`
            // so it stays aligned with `select_variant_uri`'s walk order.
            if rendition.uri().is_some() {
                let url = build_url(params, index);
                rendition.tag.set_quoted_attr("URI", &url);
            }
            index += 1;
        }
    }

    playlist
}

fn build_url(params: &RewriteParams, index: usize) -> String {
    let mut url = format!("/{}.m3u8?variant={}&stream={}", params.mode, index, params.stream);
    if let Some(start) = params.start {
        url.push_str(&format!("&start={start}"));
    }
    if let Some(duration) = params.duration {
        url.push_str(&format!("&duration={duration}"));
    }
    if let Some(ad) = params.ad {
        url.push_str(&format!("&ad={ad}"));
    }
    url
}
