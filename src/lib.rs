//! Content saver library.
//!
//! Persists a single document into a GitHub repository on behalf of a browser
//! editor, guarding the write with a shared password, per-client rate limits
//! and optimistic concurrency on the file's blob sha.

// Core subsystems
pub mod config;
pub mod http;
pub mod remote;
pub mod save;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::SaverConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
