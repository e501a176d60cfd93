//! Fixed, in-code registry mapping short stream names to upstream
//! master-playlist URLs (spec §6, §10.7).
//!
//! `stream` query values that are not registry names are accepted directly
//! as absolute `http(s)://` URLs, subject to the SSRF guard in
//! [`crate::server::url_validation`].

/// Static table of short name -> upstream master playlist URL.
const STREAMS: &[(&str, &str)] = &[
    (
        "bbb",
        "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
    ),
    (
        "tears-of-steel",
        "https://devstreaming-cdn.apple.com/videos/streaming/examples/img_bipbop_adv_example_ts/master.m3u8",
    ),
];

/// Resolve a registry short name to its upstream master playlist URL.
pub fn lookup(name: &str) -> Option<&'static str> {
    STREAMS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, url)| *url)
}
