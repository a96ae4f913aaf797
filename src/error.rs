//! Gateway error taxonomy and its HTTP rendering.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::proxy::{ProxyFailure, TransportMode};
use crate::storage::UploadError;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// A limiter policy rejected the request.
    #[error("{message}")]
    RateLimited { message: String, retry_after: Duration },

    /// The origin guard rejected a state-changing request.
    #[error("Cross-origin request blocked")]
    CrossOrigin,

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The terminal backend could not serve the request.
    #[error("{failure}")]
    Proxy {
        failure: ProxyFailure,
        mode: TransportMode,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message.into() })),
    )
        .into_response()
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::RateLimited {
                message,
                retry_after,
            } => {
                let mut response = json_error(StatusCode::TOO_MANY_REQUESTS, message);
                let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            GatewayError::CrossOrigin => {
                json_error(StatusCode::FORBIDDEN, "Cross-origin request blocked")
            }
            GatewayError::Upload(UploadError::Io(err)) => {
                tracing::error!(error = %err, "Failed to store upload");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            GatewayError::Upload(err) => json_error(err.status(), err.to_string()),
            GatewayError::Proxy { failure, mode } => failure.render(mode),
            GatewayError::Internal(detail) => {
                tracing::error!(error = %detail, "Unhandled internal error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = GatewayError::RateLimited {
            message: "slow down".into(),
            retry_after: Duration::from_millis(1500),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let response = GatewayError::RateLimited {
            message: "slow down".into(),
            retry_after: Duration::ZERO,
        }
        .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn internal_error_hides_detail() {
        let response = GatewayError::Internal("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn cross_origin_is_forbidden() {
        let response = GatewayError::CrossOrigin.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
