//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Terminal backend (ttyd) the proxy forwards to.
    pub terminal: TerminalConfig,

    /// Image upload storage.
    pub uploads: UploadConfig,

    /// Static asset directory.
    pub static_files: StaticConfig,

    /// Per-route rate limiting policies.
    pub rate_limit: RateLimitConfig,

    /// Cross-origin submission checks.
    pub origin: OriginConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Socket address string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.bind_address, self.listener.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0").
    pub bind_address: String,

    /// Listening port.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 7680,
        }
    }
}

/// Terminal backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Backend host.
    pub host: String,

    /// Backend port (ttyd).
    pub port: u16,

    /// Path prefix the proxy is mounted on. Stripped before forwarding.
    pub mount_prefix: String,

    /// Backend connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Time allowed for the backend to produce response headers, in seconds.
    pub response_timeout_secs: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7681,
            mount_prefix: "/terminal".to_string(),
            connect_timeout_secs: 5,
            response_timeout_secs: 30,
        }
    }
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory uploaded images are written to.
    pub dir: PathBuf,

    /// Maximum accepted file size in bytes.
    pub max_file_bytes: usize,

    /// Accepted content types.
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/data/images"),
            max_file_bytes: 10 * 1024 * 1024, // 10MB
            allowed_types: [
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/webp",
                "image/svg+xml",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Directory served for every path no other route claims.
    pub dir: PathBuf,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public"),
        }
    }
}

/// A single sliding-window policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimiterPolicy {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Requests admitted per window.
    pub max_requests: usize,

    /// Message returned with rejections.
    pub message: String,
}

impl LimiterPolicy {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Policy for cheap read endpoints.
    pub general: LimiterPolicy,

    /// Policy for the upload endpoint.
    pub upload: LimiterPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general: LimiterPolicy {
                window_secs: 60,
                max_requests: 60,
                message: "Too many requests, please try again later.".to_string(),
            },
            upload: LimiterPolicy {
                window_secs: 60,
                max_requests: 10,
                message: "Too many upload requests, please try again later.".to_string(),
            },
        }
    }
}

/// Origin check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Header set by a trusted ingress front-end.
    pub ingress_header: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            ingress_header: "x-ingress-path".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for locally served routes, in seconds. The terminal proxy
    /// is bounded by its own connect and response timeouts.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
