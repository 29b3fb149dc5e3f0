//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the saver.
//! All types derive Serde traits for deserialization from config files; the
//! environment overlay in `loader.rs` fills the same fields.

use serde::{Deserialize, Serialize};

/// Default target file inside the repository.
pub const DEFAULT_FILE_PATH: &str = "index.html";

/// Default maximum content size (50 MiB).
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 50 * 1024 * 1024;

/// Root configuration for the save handler.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SaverConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Remote repository access.
    pub remote: RemoteConfig,

    /// Shared secret used to authorize writes.
    pub auth: AuthConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Payload limits.
    pub limits: LimitsConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Conflict retry configuration.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Remote content repository configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Access token for the repository API.
    pub token: Option<String>,

    /// Repository in `owner/repo` form.
    pub repo: Option<String>,

    /// Base URL of the repository API.
    pub api_url: String,

    /// Branch to commit to. The repository default branch when unset.
    pub branch: Option<String>,

    /// Path of the file that receives every save.
    pub file_path: String,

    /// Deadline for each individual remote call, in seconds.
    pub call_timeout_secs: u64,

    /// Committer name recorded on each commit.
    pub committer_name: String,

    /// Committer email recorded on each commit.
    pub committer_email: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token: None,
            repo: None,
            api_url: "https://api.github.com".to_string(),
            branch: None,
            file_path: DEFAULT_FILE_PATH.to_string(),
            call_timeout_secs: 30,
            committer_name: "Content Saver".to_string(),
            committer_email: "noreply@content-saver.local".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Password every save request must present.
    pub save_password: Option<String>,
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins, in priority order. `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Payload limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum UTF-8 size of `content`, in bytes.
    pub max_content_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_content_size: DEFAULT_MAX_CONTENT_SIZE,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Fixed window length in milliseconds.
    pub window_ms: u64,

    /// Admitted requests per identifier per window.
    pub max_requests: u32,

    /// Maximum number of tracked identifiers.
    pub max_entries: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            max_requests: 30,
            max_entries: 1000,
        }
    }
}

/// Conflict retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total write attempts, including the first one.
    pub max_attempts: u32,

    /// Backoff unit; attempt `n` waits `n * base_delay_ms`.
    pub base_delay_ms: u64,

    /// How far the remote's latest commit may run ahead of the client's
    /// `lastSavedAt` before a save is rejected as stale.
    pub stale_tolerance_ms: i64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            stale_tolerance_ms: 1000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 300 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Prometheus exporter bind address. Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "content_saver=info,tower_http=info".to_string(),
            metrics_address: None,
        }
    }
}
