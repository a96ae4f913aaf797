//! Request identification.
//!
//! `SetRequestIdLayer` stamps every inbound request with a UUID v4 in
//! `X-Request-Id` (unless the client sent one) and
//! `PropagateRequestIdLayer` copies it onto the response.

use axum::body::Body;
use axum::http::Request;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The request's ID, or `"unknown"` outside the request-id layers.
pub fn request_id(request: &Request<Body>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
