//! Plain HTTP forwarding.

use axum::{
    body::Body,
    http::{Request, Version},
    response::Response,
};

use crate::proxy::{headers, ProxyFailure, TerminalProxy};

impl TerminalProxy {
    /// Forward an ordinary request to the backend and relay its response.
    pub async fn forward_http(&self, request: Request<Body>) -> Result<Response, ProxyFailure> {
        let (mut parts, body) = request.into_parts();

        parts.uri = self.target.backend_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        parts.extensions.clear();
        headers::strip_hop_by_hop(&mut parts.headers);
        headers::set_host(&mut parts.headers, &self.target.authority())?;

        let outbound = Request::from_parts(parts, body);
        let response = tokio::time::timeout(self.response_timeout, self.client.request(outbound))
            .await
            .map_err(|_| ProxyFailure::Timeout(self.response_timeout))?
            .map_err(|e| ProxyFailure::Unreachable(e.to_string()))?;

        let (mut parts, body) = response.into_parts();
        headers::strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
