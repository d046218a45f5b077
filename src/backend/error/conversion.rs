/**
 * Error Conversion
 *
 * Turns a `BackendError` into the failure envelope:
 * ```json
 * { "success": false, "message": "Goal not found", "status": 404 }
 * ```
 * Server-side failures are logged here with their full detail before the
 * generic message goes out.
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, self);
        } else {
            tracing::debug!("Request rejected with {}: {}", status, message);
        }

        error_response(status, message)
    }
}

/// Build the failure envelope for an arbitrary status
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({
        "success": false,
        "message": message.into(),
        "status": status.as_u16(),
    });
    (status, Json(body)).into_response()
}
