//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET request
//!     → report.rs (inspect SaverConfig for required settings)
//!     → HealthStatus (200 when ready, 503 otherwise)
//! ```
//!
//! # Design Decisions
//! - Readiness is the conjunction of token, repository and password presence
//! - Reports never include secret values, only whether they are set
//! - Independent of limiter state and of the remote repository

pub mod report;

pub use report::{report, HealthStatus};
