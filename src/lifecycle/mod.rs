//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics exporter → Server + GitHub client → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → broadcast → stop accepting → drain in-flight saves
//! ```

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupError};
