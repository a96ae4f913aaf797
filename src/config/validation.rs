//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, ports valid)
//! - Check the proxy mount prefix is a usable path segment
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{GatewayConfig, LimiterPolicy};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be zero")]
    ZeroValue { field: &'static str },

    #[error("terminal.mount_prefix {0:?} must start with '/' and not end with '/'")]
    InvalidMountPrefix(String),

    #[error("uploads.allowed_types must list at least one content type")]
    NoAllowedTypes,

    #[error("origin.ingress_header {0:?} is not a valid header name")]
    InvalidIngressHeader(String),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroValue { field: "listener.port" });
    }
    if config.terminal.port == 0 {
        errors.push(ValidationError::ZeroValue { field: "terminal.port" });
    }
    if config.terminal.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "terminal.connect_timeout_secs",
        });
    }
    if config.terminal.response_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "terminal.response_timeout_secs",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "timeouts.request_secs" });
    }

    let prefix = &config.terminal.mount_prefix;
    if !prefix.starts_with('/') || prefix.ends_with('/') {
        errors.push(ValidationError::InvalidMountPrefix(prefix.clone()));
    }

    if config.uploads.max_file_bytes == 0 {
        errors.push(ValidationError::ZeroValue { field: "uploads.max_file_bytes" });
    }
    if config.uploads.allowed_types.is_empty() {
        errors.push(ValidationError::NoAllowedTypes);
    }

    check_policy(
        &config.rate_limit.general,
        ("rate_limit.general.window_secs", "rate_limit.general.max_requests"),
        &mut errors,
    );
    check_policy(
        &config.rate_limit.upload,
        ("rate_limit.upload.window_secs", "rate_limit.upload.max_requests"),
        &mut errors,
    );

    let header = &config.origin.ingress_header;
    if axum::http::HeaderName::from_bytes(header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidIngressHeader(header.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_policy(
    policy: &LimiterPolicy,
    (window_field, max_field): (&'static str, &'static str),
    errors: &mut Vec<ValidationError>,
) {
    if policy.window_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: window_field });
    }
    if policy.max_requests == 0 {
        errors.push(ValidationError::ZeroValue { field: max_field });
    }
}
