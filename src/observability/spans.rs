//! Request spans carrying the correlation ID.

use axum::{body::Body, http::Request};
use tracing::Span;

use crate::http::X_REQUEST_ID;

/// Span for one HTTP request, tagged with its `x-request-id`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    )
}
