//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Write attempt against the remote repository:
//!     → timeouts.rs (every remote call has a deadline)
//!     → On revision conflict: backoff.rs (wait base × attempt, then retry)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Only revision conflicts are retried; a timeout is a plain failure
//! - Waiting goes through the `Delay` trait so retry timing is testable

pub mod backoff;
pub mod timeouts;

pub use backoff::{conflict_backoff, Delay, TokioDelay};
pub use timeouts::with_timeout;
