//! HTTP fetch with automatic retry and backoff.
//!
//! Provides [`fetch_with_retry`], the building block `fetch::HttpFetcher`
//! uses for every upstream manifest fetch.

use reqwest::{Client, Response};
use std::time::Duration;
use tracing::warn;

/// Default number of fetch attempts (1 initial + 1 retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default backoff between attempts in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 500;

/// Configuration for [`fetch_with_retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts (minimum 1; 0 is treated as 1).
    pub max_attempts: u32,
    /// Sleep duration between consecutive attempts.
    pub backoff: Duration,
    /// Optional per-request timeout applied to each individual attempt.
    ///
    /// When `None`, the client's own timeout applies.
    pub timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            timeout: None,
        }
    }
}

/// Fetch a URL via HTTP GET with automatic retry and backoff.
///
/// Attempts the request up to `config.max_attempts` times, sleeping
/// `config.backoff` between each attempt.
///
/// Returns the first successful (2xx) [`Response`], or the last
/// [`reqwest::Error`] encountered once all attempts are exhausted.
///
/// # Errors
///
/// Returns the last network or non-2xx error after all retries fail.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    config: &RetryConfig,
) -> Result<Response, reqwest::Error> {
    let max_attempts = config.max_attempts.max(1);

    // Retry loop: attempts 1 through N-1, with backoff between each.
    // The final attempt is handled separately below to guarantee a
    // return without `unreachable!()` or other panic paths.
    for attempt in 1..max_attempts {
        let mut request = client.get(url);
        if let Some(timeout) = config.timeout {
            request = request.timeout(timeout);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => return Ok(response),

            Ok(response) => {
                warn!(
                    "HTTP fetch returned {} for {} (attempt {}/{})",
                    response.status(),
                    url,
                    attempt,
                    max_attempts
                );
            }

            Err(e) => {
                warn!(
                    "HTTP fetch failed for {} (attempt {}/{}): {}",
                    url, attempt, max_attempts, e
                );
            }
        }

        warn!("Retrying HTTP fetch in {}ms...", config.backoff.as_millis());
        tokio::time::sleep(config.backoff).await;
    }

    // Final attempt — returns directly, no further retry
    let mut request = client.get(url);
    if let Some(timeout) = config.timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|e| {
        warn!(
            "HTTP fetch failed for {} (attempt {}/{}): {}",
            url, max_attempts, max_attempts, e
        );
        e
    })?;

    if !response.status().is_success() {
        warn!(
            "HTTP fetch returned {} for {} (attempt {}/{})",
            response.status(),
            url,
            max_attempts,
            max_attempts
        );
    }

    response.error_for_status()
}
