//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::response;

/// Bodies longer than this many characters are truncated in the `info` log.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The most bytes of a body that are buffered for logging.
const MAX_BUFFERED_BODY_BYTES: usize = 8 * 1024 * 1024;

/// JSON fields whose values never reach the logs.
const REDACTED_FIELDS: [&str; 1] = ["password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in JSON bodies are redacted, and multipart uploads and images
/// are logged without their bodies.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let request = if has_binary_body(&parts.headers) {
        tracing::info!("Received request: {parts:#?}\nbody: <binary>");
        Request::from_parts(parts, body)
    } else {
        let Ok(body_bytes) = axum::body::to_bytes(body, MAX_BUFFERED_BODY_BYTES).await else {
            return response::message(StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large");
        };
        let body_text = String::from_utf8_lossy(&body_bytes);
        log_body("Received request", &parts, &redact_json(&body_text));
        Request::from_parts(parts, Body::from(body_bytes))
    };

    let response = next.run(request).await;
    let (parts, body) = response.into_parts();

    if has_binary_body(&parts.headers) {
        tracing::info!("Sending response: {parts:#?}\nbody: <binary>");
        return Response::from_parts(parts, body);
    }

    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body_bytes) => {
            log_body(
                "Sending response",
                &parts,
                &String::from_utf8_lossy(&body_bytes),
            );
            Response::from_parts(parts, Body::from(body_bytes))
        }
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            response::message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn has_binary_body(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| {
            content_type.starts_with("multipart/") || content_type.starts_with("image/")
        })
}

/// Replace the values of password fields in a JSON object body.
///
/// Text that is not a JSON object is returned unchanged.
fn redact_json(body_text: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    let mut redacted = false;
    for field in REDACTED_FIELDS {
        if let Some(value) = object.get_mut(field) {
            *value = Value::String("********".to_owned());
            redacted = true;
        }
    }

    if redacted {
        Value::Object(object).to_string()
    } else {
        body_text.to_owned()
    }
}

/// The first `limit` characters of `text`, or `None` if it is not longer than that.
fn truncate(text: &str, limit: usize) -> Option<&str> {
    text.char_indices()
        .nth(limit)
        .map(|(byte_index, _)| &text[..byte_index])
}

fn log_body(label: &str, parts: &impl std::fmt::Debug, body: &str) {
    match truncate(body, LOG_BODY_LENGTH_LIMIT) {
        Some(prefix) => {
            tracing::info!("{label}: {parts:#?}\nbody: {prefix}...");
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{label}: {parts:#?}\nbody: {body:?}"),
    }
}
