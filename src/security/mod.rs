//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (same-origin check on POST/PUT/PATCH/DELETE)
//!     → route resolution
//!     → rate_limit.rs (per-route sliding window, keyed by peer IP)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Origin check runs before any limiter so denied requests cost no budget
//! - Each limiter policy owns disjoint state
//! - Rejections are expected outcomes: logged at warn, never as errors

pub mod origin;
pub mod rate_limit;

pub use origin::{OriginDecision, OriginGuard};
pub use rate_limit::{Admission, SlidingWindowLimiter};
