//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overlay: GITHUB_TOKEN, SAVE_PASSWORD, ...)
//!     → validation.rs (semantic checks)
//!     → SaverConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow an environment-only deployment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, CorsConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, RateLimitConfig,
    RemoteConfig, RetryConfig, SaverConfig, TimeoutConfig,
};
