//! JSON error responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_shared::AppError;
use tracing::{error, warn};

/// Builds the `{ "error", "message" }` response for `err`.
///
/// Server-side detail is logged and replaced with a generic message.
pub fn error_response(err: &AppError, operation: &str) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = if err.is_server_error() {
        error!(error = %err, "Failed to {operation}");
        "An error occurred"
    } else {
        warn!(error = %err, "Rejected {operation}");
        err.message()
    };

    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": message
        })),
    )
        .into_response()
}

/// Builds the 400 response for a request body that could not be decoded.
pub fn rejection_response(rejection: &JsonRejection, operation: &str) -> Response {
    error_response(&AppError::Validation(rejection.body_text()), operation)
}
