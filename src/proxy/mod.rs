//! Upgrade-aware reverse proxy to the terminal backend.
//!
//! # Data Flow
//! ```text
//! /terminal/* request
//!     → target.rs (strip mount prefix, build backend URI)
//!     → headers.rs (drop hop-by-hop, rewrite Host)
//!     → forward.rs (plain HTTP)  |  upgrade.rs (WebSocket handshake + tunnel)
//!     → failure.rs (backend errors → 502, rendered per transport mode)
//! ```
//!
//! # Design Decisions
//! - One fixed backend; no retries, the client decides when to retry
//! - Every backend wait is bounded by a timeout; tunnels are not
//! - The transport mode is chosen by the route table, not probed at failure time

pub mod failure;
pub mod forward;
pub mod headers;
pub mod target;
pub mod upgrade;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::{Duration, Instant};

use crate::config::TerminalConfig;
use crate::error::GatewayError;
use crate::observability::metrics;

pub use failure::{ProxyFailure, TransportMode, FAILURE_BODY};
pub use target::ProxyTarget;

/// Reverse proxy for the terminal backend.
pub struct TerminalProxy {
    target: ProxyTarget,
    client: Client<HttpConnector, Body>,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl TerminalProxy {
    pub fn new(config: &TerminalConfig) -> Self {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            target: ProxyTarget::from_config(config),
            client,
            connect_timeout,
            response_timeout: Duration::from_secs(config.response_timeout_secs),
        }
    }

    /// Forward `request` in the given transport mode. Backend failures are
    /// rendered into a response here; nothing is propagated to the caller.
    pub async fn forward(&self, request: Request<Body>, mode: TransportMode) -> Response {
        let start = Instant::now();
        let path = request.uri().path().to_string();

        let result = match mode {
            TransportMode::Standard => self.forward_http(request).await,
            TransportMode::Upgrade => self.forward_upgrade(request).await,
        };

        match result {
            Ok(response) => response,
            Err(failure) => {
                tracing::error!(
                    path = %path,
                    mode = mode.as_str(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %failure,
                    "Proxy error"
                );
                metrics::record_proxy_failure(mode.as_str());
                GatewayError::Proxy { failure, mode }.into_response()
            }
        }
    }
}
