//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::SaverConfig;
use crate::config::validation::{validate_config, ConfigIssue};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overlay, then
/// semantic validation.
pub fn load_config(path: Option<&Path>) -> Result<SaverConfig, ConfigError> {
    let base = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => SaverConfig::default(),
    };

    let config = apply_env(clear_blank(base), |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Treat blank optional values from the file as unset, as [`apply_env`] does
/// for the environment.
pub fn clear_blank(mut config: SaverConfig) -> SaverConfig {
    for value in [
        &mut config.remote.token,
        &mut config.remote.repo,
        &mut config.remote.branch,
        &mut config.auth.save_password,
        &mut config.observability.metrics_address,
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            *value = None;
        }
    }
    config
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests can supply their own map.
/// Empty values are treated as unset.
pub fn apply_env<F>(mut config: SaverConfig, lookup: F) -> Result<SaverConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("GITHUB_TOKEN") {
        config.remote.token = Some(token);
    }
    if let Some(repo) = get("GITHUB_REPO") {
        config.remote.repo = Some(repo.trim().to_string());
    }
    if let Some(api_url) = get("GITHUB_API_URL") {
        config.remote.api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Some(branch) = get("GITHUB_BRANCH") {
        config.remote.branch = Some(branch);
    }
    if let Some(path) = get("FILE_PATH") {
        config.remote.file_path = path;
    }
    if let Some(password) = get("SAVE_PASSWORD") {
        config.auth.save_password = Some(password);
    }
    if let Some(origins) = get("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = parse_origins(&origins);
    }
    if let Some(bind) = get("BIND_ADDRESS") {
        config.listener.bind_address = bind;
    }
    if let Some(addr) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr);
    }

    if let Some(raw) = get("MAX_CONTENT_SIZE") {
        config.limits.max_content_size = parse_number("MAX_CONTENT_SIZE", &raw)?;
    }
    if let Some(raw) = get("REMOTE_TIMEOUT_SECS") {
        config.remote.call_timeout_secs = parse_number("REMOTE_TIMEOUT_SECS", &raw)?;
    }
    if let Some(raw) = get("RATE_LIMIT_WINDOW_MS") {
        config.rate_limit.window_ms = parse_number("RATE_LIMIT_WINDOW_MS", &raw)?;
    }
    if let Some(raw) = get("RATE_LIMIT_MAX_REQUESTS") {
        config.rate_limit.max_requests = parse_number("RATE_LIMIT_MAX_REQUESTS", &raw)?;
    }

    Ok(config)
}

/// Split a comma-separated origin list, trimming entries and dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: raw.to_string(),
    })
}
