//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatcher and middleware
//! - Wire up middleware (tracing, request ID, body limit, origin guard)
//! - Dispatch requests through the ordered route table
//! - Apply per-route rate limits
//! - Bound locally served routes by the request timeout; proxied routes
//!   are bounded by the terminal backend timeouts instead
//! - Bind server to listener and run until shutdown

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{HeaderName, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::handlers;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::proxy::{TerminalProxy, TransportMode};
use crate::routing::{RouteTable, RouteTarget};
use crate::security::origin::{origin_guard_middleware, OriginGuard};
use crate::security::rate_limit::client_key;
use crate::security::{Admission, SlidingWindowLimiter};
use crate::storage::{StaticAssets, UploadStore};

/// Multipart framing allowance on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub routes: Arc<RouteTable>,
    pub proxy: Arc<TerminalProxy>,
    pub uploads: Arc<UploadStore>,
    pub assets: StaticAssets,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: Arc<GatewayConfig>,
    limiters: Vec<SlidingWindowLimiter>,
}

impl GatewayServer {
    /// Create a new gateway server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let config = Arc::new(config);

        let general = SlidingWindowLimiter::new("general", &config.rate_limit.general);
        let upload = SlidingWindowLimiter::new("upload", &config.rate_limit.upload);
        let routes = RouteTable::gateway(
            &config.terminal.mount_prefix,
            general.clone(),
            upload.clone(),
        );

        let state = AppState {
            config: config.clone(),
            routes: Arc::new(routes),
            proxy: Arc::new(TerminalProxy::new(&config.terminal)),
            uploads: Arc::new(UploadStore::new(&config.uploads)),
            assets: StaticAssets::new(&config.static_files.dir),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            limiters: vec![general, upload],
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The origin guard wraps the dispatcher directly, so it runs before
    /// route resolution and before any limiter.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let ingress_header = HeaderName::from_bytes(config.origin.ingress_header.as_bytes())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    header = %config.origin.ingress_header,
                    "Invalid ingress header name, using x-ingress-path"
                );
                HeaderName::from_static("x-ingress-path")
            });
        let guard = Arc::new(OriginGuard::new(ingress_header));

        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(middleware::from_fn_with_state(guard, origin_guard_middleware))
            .layer(DefaultBodyLimit::max(
                config.uploads.max_file_bytes + MULTIPART_OVERHEAD,
            ))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            ttyd_port = self.config.terminal.port,
            mount = %self.config.terminal.mount_prefix,
            upload_dir = %self.config.uploads.dir.display(),
            "HTTP server starting"
        );

        for limiter in &self.limiters {
            limiter.spawn_sweeper();
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Render a handler panic as a generic 500.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    GatewayError::Internal(detail).into_response()
}

/// Run a locally served route under the request timeout.
async fn within(
    deadline: Duration,
    route: &'static str,
    handler: impl Future<Output = Response>,
) -> Response {
    match tokio::time::timeout(deadline, handler).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(route, timeout_secs = deadline.as_secs(), "Request timed out");
            StatusCode::REQUEST_TIMEOUT.into_response()
        }
    }
}

/// Resolve the route, apply its limiter, and hand the request over.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();

    let Some(route) = state.routes.resolve(&request) else {
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    tracing::debug!(
        request_id = %request_id(&request),
        method = %request.method(),
        path = %request.uri().path(),
        route = route.name,
        "Dispatching request"
    );

    if let Some(limiter) = &route.limiter {
        let key = client_key(&request);
        if let Admission::Rejected {
            message,
            retry_after,
        } = limiter.admit(&key)
        {
            tracing::warn!(
                client = %key,
                policy = limiter.name(),
                route = route.name,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(limiter.name());
            let response = GatewayError::RateLimited {
                message,
                retry_after,
            }
            .into_response();
            metrics::record_request(route.name, response.status().as_u16(), start);
            return response;
        }
    }

    let deadline = Duration::from_secs(state.config.timeouts.request_secs);
    let response = match route.target {
        RouteTarget::Health => handlers::health(&state).into_response(),
        RouteTarget::Config => handlers::config(&state).into_response(),
        RouteTarget::Upload => {
            within(deadline, route.name, handlers::upload(&state, request)).await
        }
        RouteTarget::TerminalUpgrade => {
            state.proxy.forward(request, TransportMode::Upgrade).await
        }
        RouteTarget::Terminal => state.proxy.forward(request, TransportMode::Standard).await,
        RouteTarget::Static => within(deadline, route.name, state.assets.serve(request)).await,
    };

    metrics::record_request(route.name, response.status().as_u16(), start);
    response
}
