//! Backend failure outcomes and their per-transport rendering.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

use crate::proxy::headers::is_websocket_upgrade;

/// Body sent to the client whenever the terminal cannot be reached.
pub const FAILURE_BODY: &str = "Failed to connect to terminal";

/// How the client is talking to the proxy for this exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Ordinary request/response.
    Standard,
    /// WebSocket upgrade handshake.
    Upgrade,
}

impl TransportMode {
    pub fn of(request: &Request<Body>) -> Self {
        if is_websocket_upgrade(request.headers()) {
            TransportMode::Upgrade
        } else {
            TransportMode::Standard
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Standard => "standard",
            TransportMode::Upgrade => "upgrade",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyFailure {
    #[error("terminal backend unreachable: {0}")]
    Unreachable(String),

    #[error("terminal backend did not respond within {0:?}")]
    Timeout(Duration),

    #[error("invalid backend request: {0}")]
    InvalidUri(String),

    #[error("client connection cannot be upgraded")]
    NotUpgradable,
}

impl ProxyFailure {
    /// Render the failure for the transport it happened on.
    pub fn render(&self, mode: TransportMode) -> Response {
        match mode {
            TransportMode::Standard => render_standard(),
            TransportMode::Upgrade => render_upgrade(),
        }
    }
}

fn render_standard() -> Response {
    (StatusCode::BAD_GATEWAY, FAILURE_BODY).into_response()
}

/// The handshake is answered with a plain 502 and the connection is
/// closed instead of being switched to the WebSocket protocol.
fn render_upgrade() -> Response {
    let mut response = (StatusCode::BAD_GATEWAY, FAILURE_BODY).into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_failure_is_bad_gateway() {
        let response = ProxyFailure::Unreachable("refused".into()).render(TransportMode::Standard);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.headers().get(header::CONNECTION).is_none());
    }

    #[test]
    fn upgrade_failure_closes_connection() {
        let response =
            ProxyFailure::Timeout(Duration::from_secs(5)).render(TransportMode::Upgrade);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::CONNECTION], "close");
    }

    #[test]
    fn mode_detection() {
        let request = Request::builder()
            .uri("/terminal/ws")
            .header(header::CONNECTION, "Upgrade")
            .header(header::UPGRADE, "websocket")
            .body(Body::empty())
            .unwrap();
        assert_eq!(TransportMode::of(&request), TransportMode::Upgrade);

        let request = Request::builder().uri("/terminal/").body(Body::empty()).unwrap();
        assert_eq!(TransportMode::of(&request), TransportMode::Standard);
    }
}
