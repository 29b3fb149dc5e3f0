//! Response shaping and error mapping.
//!
//! # Responsibilities
//! - Map every failure kind to a fixed HTTP status
//! - Render `{ "error": ... }` bodies with a sanitized message
//! - Render the success body
//!
//! # Design Decisions
//! - Internal error detail is logged where it happens, never returned
//! - CORS headers are added by middleware, not here

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::save::{CommitError, CommitSuccess, StaleSignal, ValidationError};

/// Every way a request to the save endpoint can fail.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Invalid JSON in request body")]
    MalformedRequest,

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid password")]
    Unauthorized,

    #[error("Server configuration error")]
    Configuration,

    #[error("Rate limit exceeded")]
    RateLimited { reset_in_secs: u64 },

    #[error("Content was modified remotely after it was last saved")]
    Stale(StaleSignal),

    #[error("Save conflict: the file kept changing during the save")]
    Conflict { attempts: u32 },

    #[error("Failed to save content to the repository")]
    RemoteUnavailable,

    #[error("Internal server error")]
    Internal,
}

impl SaveError {
    pub fn status(&self) -> StatusCode {
        match self {
            SaveError::MalformedRequest => StatusCode::BAD_REQUEST,
            SaveError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            SaveError::Validation(ValidationError::TooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            SaveError::Validation(_) => StatusCode::BAD_REQUEST,
            SaveError::Unauthorized => StatusCode::UNAUTHORIZED,
            SaveError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            SaveError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            SaveError::Stale(_) | SaveError::Conflict { .. } => StatusCode::CONFLICT,
            SaveError::RemoteUnavailable | SaveError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<CommitError> for SaveError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::Stale(signal) => SaveError::Stale(signal),
            CommitError::ConflictExhausted { attempts, .. } => SaveError::Conflict { attempts },
            CommitError::ReadRevision(_) | CommitError::Write(_) => SaveError::RemoteUnavailable,
        }
    }
}

impl IntoResponse for SaveError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match self {
            SaveError::RateLimited { reset_in_secs } => {
                let mut response = (
                    status,
                    Json(json!({ "error": message, "resetIn": reset_in_secs })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(reset_in_secs));
                response
            }
            SaveError::Stale(signal) => (
                status,
                Json(json!({
                    "error": message,
                    "stale": true,
                    "serverCommitTime": signal
                        .server_commit_time
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                    "serverCommitSha": signal.server_commit_sha,
                })),
            )
                .into_response(),
            SaveError::Conflict { attempts } => (
                status,
                Json(json!({ "error": message, "attempts": attempts })),
            )
                .into_response(),
            _ => (status, Json(json!({ "error": message }))).into_response(),
        }
    }
}

/// Body of a successful save.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: &'static str,
    pub commit: String,
    pub timestamp: String,
    pub attempt: u32,
}

impl From<CommitSuccess> for SaveResponse {
    fn from(done: CommitSuccess) -> Self {
        Self {
            success: true,
            message: "Content saved successfully",
            commit: done.commit_sha,
            timestamp: done
                .completed_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            attempt: done.attempt,
        }
    }
}

impl IntoResponse for SaveResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
