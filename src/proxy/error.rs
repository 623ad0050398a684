//! Tagged failure kinds of the proxy pipeline.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Every way a proxied request can fail.
///
/// The normalizer switches on the variant; messages are already safe to show
/// to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    /// No identity could be resolved.
    #[error("Unauthorized")]
    Unauthorized,

    /// A required field is missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// The backend could not be reached or sent something unreadable.
    #[error("{0}")]
    Unreachable(String),

    /// The request body exceeds the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The backend, or the request as a whole, did not finish in time.
    #[error("{0}")]
    Timeout(String),

    /// The requested file or report does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl ProxyError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// HTTP status sent to the browser.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream { status, .. } => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            ProxyError::Unreachable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Unauthorized => "unauthorized",
            ProxyError::BadRequest(_) => "bad_request",
            ProxyError::PayloadTooLarge(_) => "payload_too_large",
            ProxyError::Upstream { .. } => "upstream",
            ProxyError::Unreachable(_) => "unreachable",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::NotFound(_) => "not_found",
        }
    }
}

/// Route-agnostic rendering: `{"error": message}`.
///
/// Route handlers use `normalize::error_response` instead, which applies the
/// route's own error shape.
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ProxyError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::PayloadTooLarge("x".into()).status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ProxyError::Unreachable("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ProxyError::Timeout("x".into()).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ProxyError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_status_only_kept_when_meaningful() {
        let err = ProxyError::Upstream {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "m".into(),
        };
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ProxyError::Upstream {
            status: StatusCode::MOVED_PERMANENTLY,
            message: "m".into(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
