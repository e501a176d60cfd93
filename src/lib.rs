//! `loopcast`: an HTTP gateway that reshapes upstream VOD HLS playlists into
//! looped VOD, simulated-live, and ad-break-stitched derivatives.
//!
//! See `playlist` for the parser/encoder/model (the Tag/Segment/Variant
//! tree), `transform` for the four manifest transformation stages, and
//! `server` for the HTTP surface that wires them together.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http_retry;
pub mod metrics;
pub mod playlist;
pub mod registry;
pub mod server;
pub mod transform;
