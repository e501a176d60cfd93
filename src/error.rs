//! Error taxonomy for the manifest engine and the HTTP layer that wraps it.
//!
//! All variants map uniformly to a 500 response with the message as the
//! body — the engine never distinguishes status codes by error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("upstream error ({status}): {message}")]
    Upstream { status: String, message: String },

    #[error("variant index out of range: {0}")]
    VariantIndex(String),

    #[error("invalid ad configuration: {0}")]
    AdConfig(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn upstream_status(status: u16) -> Self {
        Self::Upstream {
            status: status.to_string(),
            message: format!("upstream returned HTTP {status}"),
        }
    }

    pub fn upstream_transport(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    /// A caller-supplied origin URL failed the SSRF guard (spec §10.6).
    /// Classified as `Upstream` since the effect is identical: the fetch
    /// never happens.
    pub fn blocked_origin(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: "blocked".to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Upstream {
                status: "timeout".to_string(),
                message: err.to_string(),
            }
        } else {
            GatewayError::upstream_transport(err.to_string())
        }
    }
}

impl From<std::num::ParseIntError> for GatewayError {
    fn from(err: std::num::ParseIntError) -> Self {
        GatewayError::AdConfig(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for GatewayError {
    fn from(err: std::num::ParseFloatError) -> Self {
        GatewayError::AdConfig(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_formats_code() {
        let err = GatewayError::upstream_status(404);
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn upstream_transport_uses_error_marker() {
        match GatewayError::upstream_transport("connection refused") {
            GatewayError::Upstream { status, .. } => assert_eq!(status, "error"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn into_response_is_always_500() {
        let resp = GatewayError::Internal("boom".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
