//! In-memory representation of an HLS playlist.
//!
//! A [`Playlist`] is a tree: playlist-level [`Tag`]s, then either an ordered
//! list of [`Segment`]s (media playlist) or [`Variant`]s (master playlist).
//! Every tag carries its original raw text line so the encoder can re-emit
//! tags it does not otherwise understand unchanged.

pub mod encoder;
pub mod parser;

use std::collections::HashMap;

/// Whether a playlist enumerates media segments or variant streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Master,
    Media,
}

/// A single HLS tag line: `#NAME`, `#NAME:value`, or `#NAME:K=V,K=V`.
///
/// `raw_line` is reused verbatim for tags the engine never mutates. Any
/// mutator that changes `value`/`attributes` must also regenerate
/// `raw_line` from those fields on the same call — see [`Tag::set_value`]
/// and [`Tag::set_attributes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub value: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub raw_line: String,
}

impl Tag {
    /// Build a tag from a scalar value, generating its raw line.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        let raw_line = format!("#{name}:{value}");
        Self {
            name,
            value: Some(value),
            attributes: Vec::new(),
            raw_line,
        }
    }

    /// Build a bare tag with no value (e.g. `#EXT-X-DISCONTINUITY`).
    pub fn bare(name: impl Into<String>) -> Self {
        let name = name.into();
        let raw_line = format!("#{name}");
        Self {
            name,
            value: None,
            attributes: Vec::new(),
            raw_line,
        }
    }

    /// Build a tag from an attribute list, generating its raw line.
    pub fn with_attributes(name: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        let name = name.into();
        let raw_line = format!("#{name}:{}", encode_attributes(&attributes));
        Self {
            name,
            value: None,
            attributes,
            raw_line,
        }
    }

    /// Construct a tag whose raw line is preserved verbatim from input —
    /// used by the parser for tags it does not need to interpret.
    pub fn from_raw(name: impl Into<String>, value: Option<String>, raw_line: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            attributes: Vec::new(),
            raw_line: raw_line.into(),
        }
    }

    /// Look up an attribute value by name (case-sensitive, as HLS attribute
    /// names are always upper snake-case by convention).
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace an attribute's value in place, regenerating the raw line.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.attributes.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.attributes.push((key.to_string(), value));
        }
        self.raw_line = format!("#{}:{}", self.name, encode_attributes(&self.attributes));
    }

    /// Replace a *quoted-string* attribute's value by splicing only the
    /// quoted substring of the raw line, leaving every other attribute —
    /// including enumerated-string attributes like `TYPE=AUDIO` that must
    /// stay unquoted — byte-for-byte untouched. Use this instead of
    /// [`Tag::set_attr`] whenever the attribute list may contain enumerated
    /// strings, since `set_attr` regenerates the whole line through
    /// `encode_attributes`/`needs_quoting`, which would wrongly quote them.
    /// Grounded on the teacher's `hls::ll_hls::extract_quoted_uri` splice.
    pub fn set_quoted_attr(&mut self, key: &str, value: &str) {
        let marker = format!("{key}=\"");
        if let Some(marker_pos) = self.raw_line.find(&marker) {
            let value_start = marker_pos + marker.len();
            if let Some(closing_len) = self.raw_line[value_start..].find('"') {
                let quote_end = value_start + closing_len;
                self.raw_line.replace_range(value_start..quote_end, value);
            }
        }
        if let Some(entry) = self.attributes.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.attributes.push((key.to_string(), value.to_string()));
        }
    }
}

fn encode_attributes(attrs: &[(String, String)]) -> String {
    attrs
        .iter()
        .map(|(k, v)| {
            if needs_quoting(v) {
                format!("{k}=\"{v}\"")
            } else {
                format!("{k}={v}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Values that are not purely numeric/identifier-like are quoted, matching
/// how every real HLS attribute (URI, CODECS, resolution aside) is written.
fn needs_quoting(v: &str) -> bool {
    !v.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == 'x' || c == '-')
        || v.parse::<f64>().is_err() && !v.contains('x')
}

/// One media segment: its `EXTINF` line, URI, and decorating tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub duration: f64,
    pub title: Option<String>,
    pub uri: String,
    pub byte_range: Option<String>,
    pub discontinuity: bool,
    pub key: Option<Vec<(String, String)>>,
    pub map: Option<HashMap<String, String>>,
    pub program_date_time: Option<String>,
    pub date_range: Option<Vec<(String, String)>>,
    /// Tags preceding the URI line, in emission order (EXTINF included).
    pub tags: Vec<Tag>,
}

impl Segment {
    pub fn new(duration: f64, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            duration,
            title: None,
            uri: uri.clone(),
            byte_range: None,
            discontinuity: false,
            key: None,
            map: None,
            program_date_time: None,
            date_range: None,
            tags: vec![Tag::with_value("EXTINF", format!("{duration},"))],
        }
    }
}

/// One variant stream entry in a master playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub uri: String,
    pub bandwidth: u64,
    pub average_bandwidth: Option<u64>,
    pub codecs: Option<String>,
    pub resolution: Option<String>,
    pub frame_rate: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub tags: Vec<Tag>,
}

/// An `EXT-X-MEDIA` alternate-rendition entry at the playlist level.
///
/// `tag.attributes` is the authoritative attribute map; `set_attr` keeps
/// `tag.raw_line` in sync with it (see [`Tag::set_attr`]).
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRendition {
    pub tag: Tag,
}

impl MediaRendition {
    pub fn uri(&self) -> Option<&str> {
        self.tag.attr("URI")
    }
}

/// Either a media playlist's segments or a master playlist's variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Media(Vec<Segment>),
    Master {
        variants: Vec<Variant>,
        media: Vec<MediaRendition>,
    },
}

/// A fully parsed HLS playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub kind: Kind,
    pub version: Option<u32>,
    pub tags: Vec<Tag>,
    pub body: Body,
    pub source_url: String,
}

impl Playlist {
    pub fn segments(&self) -> &[Segment] {
        match &self.body {
            Body::Media(segments) => segments,
            Body::Master { .. } => &[],
        }
    }

    /// Mutable access to this playlist's segments. Fails with
    /// `GatewayError::Internal` on a master playlist rather than panicking —
    /// every transform stage must surface as a 500, never a handler panic
    /// (spec §7).
    pub fn segments_mut(&mut self) -> crate::error::Result<&mut Vec<Segment>> {
        match &mut self.body {
            Body::Media(segments) => Ok(segments),
            Body::Master { .. } => Err(crate::error::GatewayError::Internal(
                "cannot mutate segments of a master playlist".to_string(),
            )),
        }
    }

    pub fn variants(&self) -> &[Variant] {
        match &self.body {
            Body::Master { variants, .. } => variants,
            Body::Media(_) => &[],
        }
    }

    pub fn media_renditions(&self) -> &[MediaRendition] {
        match &self.body {
            Body::Master { media, .. } => media,
            Body::Media(_) => &[],
        }
    }

    /// Get a playlist-level tag by name.
    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Update (or insert) a playlist-level scalar tag, regenerating its raw
    /// line from name+value — never mutating a preserved raw line in place.
    pub fn set_tag_value(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(tag) = self.tags.iter_mut().find(|t| t.name == name) {
            tag.value = Some(value.clone());
            tag.raw_line = format!("#{name}:{value}");
        } else {
            self.tags.push(Tag::with_value(name, value));
        }
    }

    /// Insert a bare playlist-level tag if not already present.
    pub fn ensure_bare_tag(&mut self, name: &str) {
        if self.tags.iter().any(|t| t.name == name) {
            return;
        }
        self.tags.push(Tag::bare(name));
    }

    /// Remove a playlist-level tag by name, if present.
    pub fn remove_tag(&mut self, name: &str) {
        self.tags.retain(|t| t.name != name);
    }
}

/// An ad-schedule configuration: interval-repeating breaks, or a fixed list
/// of absolute timestamp breaks. See `transform::ad_injector`.
#[derive(Debug, Clone, PartialEq)]
pub enum AdConfig {
    Interval { duration: f64, interval: f64 },
    Timestamps { duration: f64, starts: Vec<f64> },
}

impl AdConfig {
    pub fn duration(&self) -> f64 {
        match self {
            AdConfig::Interval { duration, .. } => *duration,
            AdConfig::Timestamps { duration, .. } => *duration,
        }
    }
}
