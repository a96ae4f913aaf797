//! Same-origin check for state-changing requests.
//!
//! Best-effort CSRF mitigation: the request's `Origin` (or `Referer`) host
//! must match its `Host` header, unless a trusted ingress front-end marked
//! the request. It trusts `Host` and the marker header; it is not an
//! authentication mechanism.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use url::Url;

use crate::error::GatewayError;
use crate::observability::metrics;

/// Decision for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    Allow,
    Deny,
}

/// Methods the guard inspects; every other method passes unchecked.
pub fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Host component of a URL as a browser reports it: host plus a
/// non-default port.
fn url_host(source: &str) -> Option<String> {
    let url = Url::parse(source).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Apply the origin rule.
///
/// A source that fails to parse is not allowed by itself; it can still be
/// admitted by the ingress marker.
pub fn check(
    method: &Method,
    origin: Option<&str>,
    referer: Option<&str>,
    host: Option<&str>,
    has_ingress_header: bool,
) -> OriginDecision {
    if !is_mutating(method) {
        return OriginDecision::Allow;
    }

    // Blank values count as absent.
    let present = |v: &&str| !v.trim().is_empty();
    let Some(source) = origin.filter(present).or(referer.filter(present)) else {
        return OriginDecision::Allow;
    };

    if let (Some(source_host), Some(host)) = (url_host(source), host) {
        if source_host.eq_ignore_ascii_case(host) {
            return OriginDecision::Allow;
        }
    }

    if has_ingress_header {
        return OriginDecision::Allow;
    }

    OriginDecision::Deny
}

/// Shared configuration for [`origin_guard_middleware`].
#[derive(Debug, Clone)]
pub struct OriginGuard {
    ingress_header: HeaderName,
}

impl OriginGuard {
    pub fn new(ingress_header: HeaderName) -> Self {
        Self { ingress_header }
    }

    /// Evaluate a request's headers.
    pub fn evaluate(&self, request: &Request<Body>) -> OriginDecision {
        let headers = request.headers();
        let value = |name: &HeaderName| headers.get(name).and_then(|v| v.to_str().ok());

        let host = value(&header::HOST).or_else(|| request.uri().authority().map(|a| a.as_str()));

        check(
            request.method(),
            value(&header::ORIGIN),
            value(&header::REFERER),
            host,
            headers.contains_key(&self.ingress_header),
        )
    }
}

/// Middleware rejecting cross-origin state-changing requests.
pub async fn origin_guard_middleware(
    State(guard): State<Arc<OriginGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match guard.evaluate(&request) {
        OriginDecision::Allow => next.run(request).await,
        OriginDecision::Deny => {
            let source = request
                .headers()
                .get(header::ORIGIN)
                .or_else(|| request.headers().get(header::REFERER))
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            tracing::warn!(
                source = %source,
                method = %request.method(),
                path = %request.uri().path(),
                "Blocked cross-origin request"
            );
            metrics::record_origin_rejected();
            GatewayError::CrossOrigin.into_response()
        }
    }
}
