//! Upstream manifest cache: keyed store from (source URL, variant
//! discriminator) to a parsed [`Playlist`], with no eviction and no TTL
//! (spec §5, a documented limitation, not an oversight).
//!
//! Cached entries are treated as immutable. Callers must clone before
//! mutating — see [`ManifestCache::get`], which always returns an owned
//! clone, never a reference into the map.

use crate::playlist::Playlist;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Narrow interface over the process-wide manifest cache: get, put,
/// clear-for-tests (spec §9 "Global state").
#[derive(Clone, Debug)]
pub struct ManifestCache {
    entries: Arc<DashMap<String, Playlist>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Build the composite cache key for a source URL and variant
    /// discriminator ("master" or a variant index).
    pub fn key(source_url: &str, variant: &str) -> String {
        format!("{source_url}::{variant}")
    }

    /// Fetch a cached, parsed playlist by key. Returns an owned clone so the
    /// caller can mutate freely without affecting the cached canonical form.
    pub fn get(&self, key: &str) -> Option<Playlist> {
        if let Some(entry) = self.entries.get(key) {
            debug!("manifest cache HIT for {}", key);
            return Some(entry.clone());
        }
        debug!("manifest cache MISS for {}", key);
        None
    }

    /// Insert a freshly parsed playlist into the cache. A playlist only
    /// enters the cache after a successful parse — never half-populated.
    pub fn insert(&self, key: String, playlist: Playlist) {
        self.entries.insert(key, playlist);
    }

    /// Remove all entries — used by tests that need a clean cache.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::new()
    }
}
