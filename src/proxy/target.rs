//! Fixed backend target and mount prefix rewriting.

use axum::http::Uri;

use crate::config::TerminalConfig;
use crate::proxy::ProxyFailure;

/// True when `path` equals `prefix` or continues it with a `/`.
pub fn under_mount(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Where proxied traffic goes, and which path prefix it arrived under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    host: String,
    port: u16,
    mount_prefix: String,
}

impl ProxyTarget {
    pub fn new(host: impl Into<String>, port: u16, mount_prefix: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            mount_prefix: mount_prefix.into(),
        }
    }

    pub fn from_config(config: &TerminalConfig) -> Self {
        Self::new(config.host.clone(), config.port, config.mount_prefix.clone())
    }

    /// `host:port` as used in the outbound `Host` header and for dialing.
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// True when `path` is the mount point itself or lies below it.
    /// `/terminalfoo` is not under `/terminal`.
    pub fn is_mounted(&self, path: &str) -> bool {
        under_mount(&self.mount_prefix, path)
    }

    /// Origin-form path and query with the mount prefix removed.
    pub fn backend_path(&self, uri: &Uri) -> String {
        let path = uri.path();
        let stripped = if self.is_mounted(path) {
            &path[self.mount_prefix.len()..]
        } else {
            path
        };
        let stripped = if stripped.is_empty() { "/" } else { stripped };

        match uri.query() {
            Some(query) => format!("{stripped}?{query}"),
            None => stripped.to_string(),
        }
    }

    /// Absolute backend URI for `uri`.
    pub fn backend_uri(&self, uri: &Uri) -> Result<Uri, ProxyFailure> {
        let target = format!("http://{}{}", self.authority(), self.backend_path(uri));
        target
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| ProxyFailure::InvalidUri(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ProxyTarget {
        ProxyTarget::new("127.0.0.1", 7681, "/terminal")
    }

    #[test]
    fn mount_matching_respects_segments() {
        let target = target();
        assert!(target.is_mounted("/terminal"));
        assert!(target.is_mounted("/terminal/"));
        assert!(target.is_mounted("/terminal/ws"));
        assert!(!target.is_mounted("/terminalfoo"));
        assert!(!target.is_mounted("/health"));
    }

    #[test]
    fn strips_prefix_and_keeps_query() {
        let target = target();
        let uri: Uri = "/terminal/foo/bar?arg=1".parse().unwrap();
        assert_eq!(target.backend_path(&uri), "/foo/bar?arg=1");

        let uri: Uri = "/terminal".parse().unwrap();
        assert_eq!(target.backend_path(&uri), "/");

        let uri: Uri = "/terminal?x=y".parse().unwrap();
        assert_eq!(target.backend_path(&uri), "/?x=y");
    }

    #[test]
    fn backend_uri_points_at_target() {
        let uri: Uri = "/terminal/token".parse().unwrap();
        let backend = target().backend_uri(&uri).unwrap();
        assert_eq!(backend.to_string(), "http://127.0.0.1:7681/token");
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let target = ProxyTarget::new("::1", 7681, "/terminal");
        assert_eq!(target.authority(), "[::1]:7681");
    }
}
