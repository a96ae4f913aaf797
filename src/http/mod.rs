//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID stamped and propagated)
//!     → origin guard (mutating methods)
//!     → route table → limiter → handlers.rs | proxy | static assets
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
