//! WebSocket upgrade forwarding.
//!
//! # Data Flow
//! ```text
//! Client ──handshake──→ Proxy ──handshake──→ Backend
//!        ←──── 101 ────       ←──── 101 ────
//! Client ←═══ raw bytes (copy_bidirectional) ═══→ Backend
//! ```
//!
//! The tunnel task is spawned and forgotten; it ends when either side
//! closes its connection.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::proxy::{headers, ProxyFailure, TerminalProxy};

impl TerminalProxy {
    /// Forward a WebSocket handshake and, once the backend accepts it,
    /// splice the two upgraded connections together.
    pub async fn forward_upgrade(&self, request: Request<Body>) -> Result<Response, ProxyFailure> {
        let (mut parts, _body) = request.into_parts();
        let client_upgrade = parts
            .extensions
            .remove::<OnUpgrade>()
            .ok_or(ProxyFailure::NotUpgradable)?;

        let path = self.target.backend_path(&parts.uri);
        let authority = self.target.authority();

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&authority))
            .await
            .map_err(|_| ProxyFailure::Timeout(self.connect_timeout))?
            .map_err(|e| ProxyFailure::Unreachable(e.to_string()))?;

        let (mut sender, connection) =
            hyper::client::conn::http1::handshake::<_, Body>(TokioIo::new(stream))
                .await
                .map_err(|e| ProxyFailure::Unreachable(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.with_upgrades().await {
                tracing::debug!(error = %e, "Backend upgrade connection ended with error");
            }
        });

        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(path.as_str())
            .body(Body::empty())
            .map_err(|e| ProxyFailure::InvalidUri(e.to_string()))?;
        *outbound.headers_mut() = parts.headers;
        headers::set_host(outbound.headers_mut(), &authority)?;

        let mut response =
            tokio::time::timeout(self.response_timeout, sender.send_request(outbound))
                .await
                .map_err(|_| ProxyFailure::Timeout(self.response_timeout))?
                .map_err(|e| ProxyFailure::Unreachable(e.to_string()))?;

        if response.status() != StatusCode::SWITCHING_PROTOCOLS {
            tracing::warn!(
                path = %path,
                status = %response.status(),
                "Backend declined WebSocket upgrade"
            );
            let (parts, body) = response.into_parts();
            return Ok(Response::from_parts(parts, Body::new(body)));
        }

        let backend_upgrade = hyper::upgrade::on(&mut response);
        tokio::spawn(tunnel(client_upgrade, backend_upgrade, path));

        let (parts, _) = response.into_parts();
        Ok(Response::from_parts(parts, Body::empty()))
    }
}

/// Copy bytes between the two upgraded connections until one side closes.
async fn tunnel(client: OnUpgrade, backend: OnUpgrade, path: String) {
    let (client, backend) = match tokio::try_join!(client, backend) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "WebSocket upgrade did not complete");
            return;
        }
    };

    tracing::debug!(path = %path, "WebSocket tunnel established");

    let mut client = TokioIo::new(client);
    let mut backend = TokioIo::new(backend);
    match tokio::io::copy_bidirectional(&mut client, &mut backend).await {
        Ok((from_client, from_backend)) => tracing::debug!(
            path = %path,
            from_client,
            from_backend,
            "WebSocket tunnel closed"
        ),
        Err(e) => tracing::debug!(path = %path, error = %e, "WebSocket tunnel closed with error"),
    }
}
