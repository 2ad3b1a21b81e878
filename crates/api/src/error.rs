//! HTTP error mapping.
//!
//! Every failure a handler can hit becomes HTTP 400 with `{"error": msg}`.
//! Absence of a record never reaches this module; it is a successful
//! response with null fields.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ferry_index::IndexError;
use serde_json::json;

/// A request failure, rendered as a 400 with a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub IndexError);

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        tracing::debug!(error = %message, "request failed");
        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
    }
}

/// Parse a path index as decimal or 0x-prefixed hex.
pub fn parse_index(raw: &str) -> Result<u64, ApiError> {
    let parsed = match raw.strip_prefix("0x") {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => raw.parse(),
    };
    parsed.map_err(|_| {
        ApiError(IndexError::InvalidParam(format!(
            "index must be a non-negative integer, got {raw:?}"
        )))
    })
}
