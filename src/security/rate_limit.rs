//! Sliding-window rate limiting keyed by client address.
//!
//! Each limiter instance owns its own window map; the gateway runs one
//! per policy (general, upload) and their counts never mix.

use axum::{body::Body, extract::ConnectInfo, http::Request};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::config::LimiterPolicy;

/// Key shared by every request whose peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Outcome of a single admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected {
        message: String,
        /// Time until the oldest counted request leaves the window.
        retry_after: Duration,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Per-key sliding-window limiter.
///
/// Cloning is cheap and shares state.
#[derive(Clone)]
pub struct SlidingWindowLimiter {
    inner: Arc<LimiterInner>,
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("name", &self.inner.name)
            .field("window", &self.inner.window)
            .field("max", &self.inner.max)
            .finish()
    }
}

struct LimiterInner {
    name: &'static str,
    window: Duration,
    max: usize,
    message: String,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl LimiterInner {
    fn windows(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cutoff(&self, now: Instant) -> Option<Instant> {
        now.checked_sub(self.window)
    }

    /// Drop every key with no timestamps left inside the window.
    fn sweep(&self, now: Instant) -> usize {
        let cutoff = self.cutoff(now);
        let mut windows = self.windows();
        let before = windows.len();
        windows.retain(|_, stamps| {
            prune(stamps, cutoff);
            !stamps.is_empty()
        });
        before - windows.len()
    }
}

fn prune(stamps: &mut VecDeque<Instant>, cutoff: Option<Instant>) {
    if let Some(cutoff) = cutoff {
        stamps.retain(|t| *t > cutoff);
    }
}

impl SlidingWindowLimiter {
    /// Create a limiter from a configured policy.
    pub fn new(name: &'static str, policy: &LimiterPolicy) -> Self {
        Self::with_window(name, policy.window(), policy.max_requests, policy.message.clone())
    }

    pub fn with_window(
        name: &'static str,
        window: Duration,
        max: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(LimiterInner {
                name,
                window,
                max,
                message: message.into(),
                windows: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Policy name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Check and record a request for `key` arriving now.
    pub fn admit(&self, key: &str) -> Admission {
        self.admit_at(key, Instant::now())
    }

    /// Check and record a request for `key` arriving at `now`.
    ///
    /// Pruning, the count check and the append happen under one lock, so
    /// concurrent callers can never both take the last slot.
    pub fn admit_at(&self, key: &str, now: Instant) -> Admission {
        let inner = &self.inner;
        let cutoff = inner.cutoff(now);
        let mut windows = inner.windows();

        if let Some(stamps) = windows.get_mut(key) {
            prune(stamps, cutoff);
            if stamps.len() >= inner.max {
                let oldest = stamps.iter().min().copied().unwrap_or(now);
                let retry_after = (oldest + inner.window).saturating_duration_since(now);
                return Admission::Rejected {
                    message: inner.message.clone(),
                    retry_after,
                };
            }
            stamps.push_back(now);
            return Admission::Allowed;
        }

        if inner.max == 0 {
            return Admission::Rejected {
                message: inner.message.clone(),
                retry_after: inner.window,
            };
        }
        windows.insert(key.to_string(), VecDeque::from([now]));
        Admission::Allowed
    }

    /// Remove idle keys. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        self.inner.sweep(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        self.inner.sweep(now)
    }

    /// Number of keys currently holding window state.
    pub fn tracked_keys(&self) -> usize {
        self.inner.windows().len()
    }

    /// Spawn the periodic sweep on the current runtime.
    ///
    /// The task holds only a weak reference: it stops on its own once
    /// every handle to this limiter is dropped.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.window;
        let name = self.inner.name;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let removed = inner.sweep(Instant::now());
                if removed > 0 {
                    tracing::debug!(policy = name, removed, "Swept idle rate limit keys");
                }
            }
            tracing::trace!(policy = name, "Rate limit sweeper stopped");
        })
    }
}

/// Rate limit key for a request: the peer IP, or [`UNKNOWN_CLIENT`].
pub fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
