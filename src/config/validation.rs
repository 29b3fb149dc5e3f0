//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes, windows, attempts > 0)
//! - Check the repository identifier shape
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Missing secrets are NOT errors here: the health endpoint reports them
//!   and save requests answer 500 until they are provided

use std::fmt;

use crate::config::schema::SaverConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &SaverConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if let Some(repo) = &config.remote.repo {
        let mut parts = repo.split('/');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !valid {
            issues.push(ConfigIssue::new("remote.repo", "expected owner/repo"));
        }
    }

    if config.remote.file_path.trim().is_empty() {
        issues.push(ConfigIssue::new("remote.file_path", "must not be empty"));
    }

    if url::Url::parse(&config.remote.api_url).is_err() {
        issues.push(ConfigIssue::new("remote.api_url", "not a valid URL"));
    }

    if config.remote.call_timeout_secs == 0 {
        issues.push(ConfigIssue::new("remote.call_timeout_secs", "must be > 0"));
    }

    if config.limits.max_content_size == 0 {
        issues.push(ConfigIssue::new("limits.max_content_size", "must be > 0"));
    }

    if config.rate_limit.window_ms == 0 {
        issues.push(ConfigIssue::new("rate_limit.window_ms", "must be > 0"));
    }
    if config.rate_limit.max_requests == 0 {
        issues.push(ConfigIssue::new("rate_limit.max_requests", "must be > 0"));
    }
    if config.rate_limit.max_entries == 0 {
        issues.push(ConfigIssue::new("rate_limit.max_entries", "must be > 0"));
    }

    if config.retries.max_attempts == 0 {
        issues.push(ConfigIssue::new("retries.max_attempts", "must be > 0"));
    }

    if config.cors.allowed_origins.is_empty() {
        issues.push(ConfigIssue::new("cors.allowed_origins", "must list at least one origin"));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
