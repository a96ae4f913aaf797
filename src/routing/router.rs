//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store routes in precedence order
//! - Look up the first route matching a request
//! - Carry the limiter policy that guards each route
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Precedence is the order of the Vec; the static catch-all is last
//! - O(n) scan (acceptable for a handful of routes)

use axum::body::Body;
use axum::http::{Method, Request};

use crate::routing::matcher::{
    AndMatcher, AnyMatcher, ExactPathMatcher, Matcher, MethodMatcher, MountMatcher,
    UpgradeMatcher,
};
use crate::security::SlidingWindowLimiter;

/// What a matched route hands the request to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Health,
    Config,
    Upload,
    /// WebSocket handshake under the proxy mount.
    TerminalUpgrade,
    /// Plain HTTP under the proxy mount.
    Terminal,
    Static,
}

/// A single entry of the route table.
#[derive(Debug)]
pub struct Route {
    pub name: &'static str,
    matcher: Box<dyn Matcher>,
    pub limiter: Option<SlidingWindowLimiter>,
    pub target: RouteTarget,
}

impl Route {
    pub fn new(
        name: &'static str,
        matcher: Box<dyn Matcher>,
        limiter: Option<SlidingWindowLimiter>,
        target: RouteTarget,
    ) -> Self {
        Self {
            name,
            matcher,
            limiter,
            target,
        }
    }
}

/// Ordered route table. The first matching route wins.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The gateway's routes.
    ///
    /// Upgrade handshakes under the mount are claimed before anything else.
    /// API routes precede the proxy mount, and static files come last
    /// because they match every path.
    pub fn gateway(
        mount_prefix: &str,
        general: SlidingWindowLimiter,
        upload: SlidingWindowLimiter,
    ) -> Self {
        let endpoint = |method: Method, path: &str| -> Box<dyn Matcher> {
            Box::new(AndMatcher::new(vec![
                Box::new(MethodMatcher::new(method)),
                Box::new(ExactPathMatcher::new(path)),
            ]))
        };

        Self::new(vec![
            Route::new(
                "terminal-upgrade",
                Box::new(AndMatcher::new(vec![
                    Box::new(UpgradeMatcher),
                    Box::new(MountMatcher::new(mount_prefix)),
                ])),
                None,
                RouteTarget::TerminalUpgrade,
            ),
            Route::new(
                "health",
                endpoint(Method::GET, "/health"),
                Some(general.clone()),
                RouteTarget::Health,
            ),
            Route::new(
                "config",
                endpoint(Method::GET, "/config"),
                Some(general),
                RouteTarget::Config,
            ),
            Route::new(
                "upload",
                endpoint(Method::POST, "/upload"),
                Some(upload),
                RouteTarget::Upload,
            ),
            Route::new(
                "terminal",
                Box::new(MountMatcher::new(mount_prefix)),
                None,
                RouteTarget::Terminal,
            ),
            Route::new("static", Box::new(AnyMatcher), None, RouteTarget::Static),
        ])
    }

    /// Find the first route matching `req`.
    pub fn resolve(&self, req: &Request<Body>) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(req))
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<&'static str> {
        self.routes.iter().map(|r| r.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn table() -> RouteTable {
        let general = SlidingWindowLimiter::with_window("general", Duration::from_secs(60), 60, "g");
        let upload = SlidingWindowLimiter::with_window("upload", Duration::from_secs(60), 10, "u");
        RouteTable::gateway("/terminal", general, upload)
    }

    fn target_of(table: &RouteTable, req: Request<Body>) -> RouteTarget {
        table.resolve(&req).expect("static route matches everything").target
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn static_route_is_last() {
        assert_eq!(
            table().names(),
            vec!["terminal-upgrade", "health", "config", "upload", "terminal", "static"]
        );
    }

    #[test]
    fn api_routes_resolve_before_static() {
        let table = table();
        assert_eq!(target_of(&table, request(Method::GET, "/health")), RouteTarget::Health);
        assert_eq!(target_of(&table, request(Method::GET, "/config")), RouteTarget::Config);
        assert_eq!(target_of(&table, request(Method::POST, "/upload")), RouteTarget::Upload);
        assert_eq!(target_of(&table, request(Method::GET, "/upload")), RouteTarget::Static);
        assert_eq!(target_of(&table, request(Method::POST, "/health")), RouteTarget::Static);
        assert_eq!(target_of(&table, request(Method::GET, "/index.html")), RouteTarget::Static);
    }

    #[test]
    fn proxy_mount_resolves_before_static() {
        let table = table();
        assert_eq!(target_of(&table, request(Method::GET, "/terminal/")), RouteTarget::Terminal);
        assert_eq!(target_of(&table, request(Method::POST, "/terminal/token")), RouteTarget::Terminal);
        assert_eq!(target_of(&table, request(Method::GET, "/terminalx")), RouteTarget::Static);
    }

    #[test]
    fn upgrades_under_mount_take_upgrade_path() {
        let table = table();
        let upgrade = Request::builder()
            .uri("/terminal/ws")
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .body(Body::empty())
            .unwrap();
        assert_eq!(target_of(&table, upgrade), RouteTarget::TerminalUpgrade);

        let elsewhere = Request::builder()
            .uri("/ws")
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .body(Body::empty())
            .unwrap();
        assert_eq!(target_of(&table, elsewhere), RouteTarget::Static);
    }

    #[test]
    fn limiters_attach_per_route() {
        let table = table();
        let health = table.resolve(&request(Method::GET, "/health")).unwrap();
        let upload = table.resolve(&request(Method::POST, "/upload")).unwrap();
        let terminal = table.resolve(&request(Method::GET, "/terminal/")).unwrap();

        assert_eq!(health.limiter.as_ref().map(|l| l.name()), Some("general"));
        assert_eq!(upload.limiter.as_ref().map(|l| l.name()), Some("upload"));
        assert!(terminal.limiter.is_none());
    }

    #[test]
    fn first_match_wins() {
        let table = RouteTable::new(vec![
            Route::new("first", Box::new(AnyMatcher), None, RouteTarget::Health),
            Route::new("second", Box::new(AnyMatcher), None, RouteTarget::Static),
        ]);
        let route = table.resolve(&request(Method::GET, "/anything")).unwrap();
        assert_eq!(route.name, "first");
    }
}
