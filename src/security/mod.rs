//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (resolve origin; headers attached to every response)
//!     → rate_limit.rs (per-client fixed window, POST only)
//!     → [handler validates payload]
//!     → auth.rs (shared-secret password check)
//!     → Pass to commit orchestration
//! ```
//!
//! # Design Decisions
//! - Admission control runs before the body is parsed
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use rate_limit::{RateLimitDecision, RateLimiter};
