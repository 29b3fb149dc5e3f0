//! Cross-origin policy.
//!
//! # Responsibilities
//! - Resolve the `Access-Control-Allow-Origin` value for a request
//! - Build the CORS header set shared by every response
//! - Answer preflight requests
//!
//! # Design Decisions
//! - Resolution is total: every input yields an origin string
//! - The literal `null` origin (pages opened from local files) is only echoed
//!   when the allow-list explicitly permits it or contains `*`
//! - Headers are attached by middleware so that every exit path, including
//!   rate-limit rejections, carries them

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE, ORIGIN, VARY,
        },
        HeaderMap, HeaderValue, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;

pub const WILDCARD: &str = "*";
pub const NULL_ORIGIN: &str = "null";
pub const ALLOWED_METHODS: &str = "POST, OPTIONS, GET";
pub const ALLOWED_HEADERS: &str = "Content-Type";
pub const PREFLIGHT_MAX_AGE_SECS: u32 = 86_400;

/// Pick the origin to echo back for `request_origin`.
pub fn resolve_origin(allowed: &[String], request_origin: Option<&str>) -> String {
    let has_wildcard = allowed.iter().any(|o| o == WILDCARD);

    if request_origin == Some(NULL_ORIGIN) {
        if has_wildcard || allowed.iter().any(|o| o == NULL_ORIGIN) {
            return NULL_ORIGIN.to_string();
        }
        return fallback_origin(allowed);
    }

    if has_wildcard {
        return request_origin.unwrap_or(WILDCARD).to_string();
    }

    match request_origin {
        Some(origin) if allowed.iter().any(|o| o == origin) => origin.to_string(),
        _ => fallback_origin(allowed),
    }
}

/// First allowed entry that is not `null`, else the first entry.
fn fallback_origin(allowed: &[String]) -> String {
    allowed
        .iter()
        .find(|o| o.as_str() != NULL_ORIGIN)
        .or_else(|| allowed.first())
        .cloned()
        .unwrap_or_else(|| WILDCARD.to_string())
}

/// CORS headers for `origin`, optionally with a JSON content type.
pub fn build_headers(origin: &str, include_content_type: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();

    // Origins come from the client; anything that is not a valid header
    // value degrades to the wildcard.
    let origin_value =
        HeaderValue::from_str(origin).unwrap_or_else(|_| HeaderValue::from_static(WILDCARD));
    let is_wildcard = origin_value == WILDCARD;

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin_value);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    if !is_wildcard {
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
    if include_content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    headers
}

fn request_origin(headers: &HeaderMap) -> Option<&str> {
    headers.get(ORIGIN).and_then(|v| v.to_str().ok())
}

/// Run `resolve`, falling back to the request origin (or `*`) if it panics.
fn resolve_or_fallback<F>(requested: Option<&str>, resolve: F) -> String
where
    F: FnOnce() -> String + std::panic::UnwindSafe,
{
    std::panic::catch_unwind(resolve).unwrap_or_else(|_| {
        tracing::error!("Origin resolution failed");
        requested.unwrap_or(WILDCARD).to_string()
    })
}

/// Origin for a request under `allowed`. Never fails.
pub fn origin_for(allowed: &[String], headers: &HeaderMap) -> String {
    let requested = request_origin(headers);
    resolve_or_fallback(requested, || resolve_origin(allowed, requested))
}

/// Attach CORS headers to every response.
pub async fn cors_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = origin_for(&state.config.cors.allowed_origins, request.headers());

    let mut response = next.run(request).await;
    response.headers_mut().extend(build_headers(&origin, false));
    response
}

/// Preflight handler. Always answers 200.
pub async fn preflight_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let origin = origin_for(&state.config.cors.allowed_origins, &headers);

    let mut response_headers = build_headers(&origin, false);
    response_headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(PREFLIGHT_MAX_AGE_SECS));

    (StatusCode::OK, response_headers).into_response()
}
