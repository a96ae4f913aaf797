//! Edge gateway for a browser terminal: rate limits, origin checks,
//! a WebSocket-aware proxy to ttyd, image uploads and static assets.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;
pub mod storage;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
