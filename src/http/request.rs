//! Request handling.
//!
//! # Responsibilities
//! - Correlation ID (`x-request-id`) generation and propagation
//! - Bounded reading of the save body
//! - JSON decoding into [`SaveRequest`]

use axum::body::Body;
use futures_util::StreamExt;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::http::response::SaveError;
use crate::save::SaveRequest;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Slack on top of the content limit for JSON escaping and the other fields.
const BODY_OVERHEAD: usize = 1024 * 1024;

/// Layer that assigns a UUID v4 request ID when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Largest body accepted for a given content limit.
pub fn body_limit(max_content_size: usize) -> usize {
    max_content_size
        .saturating_mul(2)
        .saturating_add(BODY_OVERHEAD)
}

/// Read and decode a save body of at most `limit` bytes.
///
/// Only a body past `limit` is `BodyTooLarge`. A body that fails mid-read
/// is `MalformedRequest`.
pub async fn read_save_request(body: Body, limit: usize) -> Result<SaveRequest, SaveError> {
    let bytes = read_limited(body, limit).await?;
    parse_save_request(&bytes)
}

async fn read_limited(body: Body, limit: usize) -> Result<Vec<u8>, SaveError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read request body");
            SaveError::MalformedRequest
        })?;
        if buf.len().saturating_add(chunk.len()) > limit {
            tracing::warn!(limit, "Request body over limit");
            return Err(SaveError::BodyTooLarge);
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

/// Decode a save body. Anything that is not a JSON object is malformed.
pub fn parse_save_request(bytes: &[u8]) -> Result<SaveRequest, SaveError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|_| SaveError::MalformedRequest)?;
    if !value.is_object() {
        return Err(SaveError::MalformedRequest);
    }
    serde_json::from_value(value).map_err(|_| SaveError::MalformedRequest)
}
