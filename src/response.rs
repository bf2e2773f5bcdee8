//! The JSON envelope shared by every endpoint: `{"message", "data", "meta"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::pagination::PageMeta;

/// A response with only a message.
pub fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// A response with a message and a data payload.
pub fn data<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (status, Json(json!({ "message": message, "data": data }))).into_response()
}

/// A 200 response with a page of data and its paging metadata.
pub fn paged<T: Serialize>(message: &str, data: T, meta: PageMeta) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "message": message, "data": data, "meta": meta })),
    )
        .into_response()
}
