//! Configuration readiness report.
//!
//! Pure function of the configuration: no remote calls, no limiter access.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::SaverConfig;

/// Which settings are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationStatus {
    pub github_token: bool,
    pub github_repo: bool,
    pub save_password: bool,
    pub file_path: String,
    pub allowed_origins: usize,
    pub max_content_size: usize,
    pub ready: bool,
}

/// Rate limiter settings, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitingStatus {
    pub window: String,
    pub max_requests: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub configuration: ConfigurationStatus,
    pub rate_limiting: RateLimitingStatus,
}

impl HealthStatus {
    pub fn is_ready(&self) -> bool {
        self.configuration.ready
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn format_window(window_ms: u64) -> String {
    if window_ms % 1000 == 0 {
        format!("{}s", window_ms / 1000)
    } else {
        format!("{window_ms}ms")
    }
}

/// Build the health report for `config`.
pub fn report(config: &SaverConfig) -> HealthStatus {
    let github_token = present(&config.remote.token);
    let github_repo = present(&config.remote.repo);
    let save_password = present(&config.auth.save_password);
    let ready = github_token && github_repo && save_password;

    HealthStatus {
        status: if ready { "ok" } else { "misconfigured" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        configuration: ConfigurationStatus {
            github_token,
            github_repo,
            save_password,
            file_path: config.remote.file_path.clone(),
            allowed_origins: config.cors.allowed_origins.len(),
            max_content_size: config.limits.max_content_size,
            ready,
        },
        rate_limiting: RateLimitingStatus {
            window: format_window(config.rate_limit.window_ms),
            max_requests: config.rate_limit.max_requests,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> SaverConfig {
        let mut config = SaverConfig::default();
        config.remote.token = Some("ghp_x".into());
        config.remote.repo = Some("alice/wiki".into());
        config.auth.save_password = Some("pw".into());
        config
    }

    #[test]
    fn test_ready_when_all_secrets_present() {
        let status = report(&configured());
        assert!(status.is_ready());
        assert_eq!(status.status, "ok");
        assert_eq!(status.rate_limiting.window, "60s");
        assert_eq!(status.rate_limiting.max_requests, 30);
    }

    #[test]
    fn test_each_missing_secret_blocks_readiness() {
        let mut config = configured();
        config.auth.save_password = None;
        let status = report(&config);
        assert!(!status.is_ready());
        assert!(!status.configuration.save_password);
        assert!(status.configuration.github_token);

        let mut config = configured();
        config.remote.token = Some("   ".into());
        assert!(!report(&config).is_ready());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(report(&configured())).unwrap();
        assert_eq!(json["configuration"]["ready"], true);
        assert_eq!(json["configuration"]["githubRepo"], true);
        assert_eq!(json["rateLimiting"]["maxRequests"], 30);
        assert!(json["timestamp"].is_string());
        assert!(json.get("configuration").unwrap().get("githubToken").is_some());
    }

    #[test]
    fn test_report_never_leaks_secrets() {
        let rendered = serde_json::to_string(&report(&configured())).unwrap();
        assert!(!rendered.contains("ghp_x"));
        assert!(!rendered.contains("\"pw\""));
    }
}
