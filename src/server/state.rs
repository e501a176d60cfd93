//! Shared application state: configuration, a pooled HTTP client wrapped in
//! the [`Fetcher`] trait, and the process-wide manifest [`ManifestCache`].

use crate::cache::ManifestCache;
use crate::config::Config;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::metrics;
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn Fetcher>,
    pub cache: ManifestCache,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .expect("failed to create HTTP client");

        let timeout = Duration::from_millis(config.fetch_timeout_ms);
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(http_client, timeout));

        Self {
            config: Arc::new(config),
            fetcher,
            cache: ManifestCache::new(),
            metrics_handle: metrics::install(),
        }
    }

    /// Construct state around a caller-supplied fetcher — used by tests that
    /// stub the upstream without a real network call.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            cache: ManifestCache::new(),
            metrics_handle: metrics::install(),
        }
    }
}
