//! Endpoint handlers.
//!
//! `POST` saves, `GET` reports configuration health. `OPTIONS` is answered by
//! [`crate::security::cors::preflight_handler`].

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::health;
use crate::http::request::{body_limit, read_save_request};
use crate::http::response::{SaveError, SaveResponse};
use crate::http::server::AppState;
use crate::save::CommitRequest;
use crate::security::auth::verify_password;

/// Validate, authenticate and commit one save.
pub async fn save_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<SaveResponse, SaveError> {
    let limit = body_limit(state.validator.max_content_size());
    let payload = read_save_request(request.into_body(), limit).await?;

    let save = state.validator.validate(payload).map_err(|e| {
        tracing::info!(reason = %e, "Rejected save payload");
        SaveError::from(e)
    })?;

    let expected = state.config.auth.save_password.as_deref();
    let Some(expected) = expected.filter(|p| !p.trim().is_empty()) else {
        tracing::error!("Save password is not configured");
        return Err(SaveError::Configuration);
    };
    if !verify_password(expected, &save.password) {
        tracing::warn!("Invalid password attempt");
        return Err(SaveError::Unauthorized);
    }

    let Some(orchestrator) = state.orchestrator.as_ref() else {
        tracing::error!("Remote repository credentials are not configured");
        return Err(SaveError::Configuration);
    };

    let done = orchestrator
        .commit(CommitRequest {
            content: &save.content,
            path: &state.config.remote.file_path,
            timestamp: save.timestamp,
            last_saved_at: save.last_saved_at,
        })
        .await?;

    tracing::info!(
        commit = %done.commit_sha,
        attempt = done.attempt,
        bytes = save.content.len(),
        "Content saved"
    );
    Ok(SaveResponse::from(done))
}

/// Configuration readiness. 200 when ready, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let status = health::report(&state.config);
    let code = if status.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}
