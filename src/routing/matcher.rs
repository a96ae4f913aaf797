//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method
//! - Match exact paths and mount prefixes (case-sensitive)
//! - Detect WebSocket upgrade handshakes
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Mount prefixes match on segment boundaries only
//! - No regex to guarantee O(n) matching

use axum::body::Body;
use axum::http::{Method, Request};

use crate::proxy::headers::is_websocket_upgrade;
use crate::proxy::target::under_mount;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches a set of methods. `GET` also admits `HEAD`.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(method: Method) -> Self {
        let mut methods = vec![method.clone()];
        if method == Method::GET {
            methods.push(Method::HEAD);
        }
        Self { methods }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.methods.contains(req.method())
    }
}

/// Matches one exact path.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path() == self.path
    }
}

/// Matches a mount point and everything below it.
#[derive(Debug, Clone)]
pub struct MountMatcher {
    prefix: String,
}

impl MountMatcher {
    /// Create a new mount matcher. `prefix` must not end with `/`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for MountMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        under_mount(&self.prefix, req.uri().path())
    }
}

/// Matches WebSocket upgrade handshakes.
#[derive(Debug, Clone, Default)]
pub struct UpgradeMatcher;

impl Matcher for UpgradeMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        is_websocket_upgrade(req.headers())
    }
}

/// Matches everything.
#[derive(Debug, Clone, Default)]
pub struct AnyMatcher;

impl Matcher for AnyMatcher {
    fn matches(&self, _req: &Request<Body>) -> bool {
        true
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(req))
    }
}
