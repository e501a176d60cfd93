//! Pluggable upstream fetcher (spec §4.7): given an absolute URL, return the
//! body text or fail with an [`GatewayError::Upstream`].
//!
//! A body is valid only if it contains the literal `#EXTM3U`. The SSRF guard
//! runs once, at the boundary where a caller-supplied `stream` query value
//! becomes an absolute URL (`handlers::common::resolve_stream_url`) — not
//! here, since variant/media URIs resolved against an already-validated
//! master are not independently caller-controlled.

use crate::error::GatewayError;
use crate::http_retry::{fetch_with_retry, RetryConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, GatewayError>;
}

/// Real HTTP fetcher: retries with backoff and enforces a bounded timeout
/// (spec §5).
pub struct HttpFetcher {
    client: Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            retry: RetryConfig {
                timeout: Some(timeout),
                ..RetryConfig::default()
            },
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, GatewayError> {
        let response = fetch_with_retry(&self.client, url, &self.retry)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Upstream {
                        status: "timeout".to_string(),
                        message: e.to_string(),
                    }
                } else if let Some(status) = e.status() {
                    GatewayError::upstream_status(status.as_u16())
                } else {
                    GatewayError::upstream_transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::upstream_status(status.as_u16()));
        }

        let body = response.text().await?;
        if !body.contains("#EXTM3U") {
            return Err(GatewayError::Upstream {
                status: "error".to_string(),
                message: "response body missing #EXTM3U sentinel".to_string(),
            });
        }

        Ok(body)
    }
}
