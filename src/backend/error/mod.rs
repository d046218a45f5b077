//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//! These errors are used in HTTP handlers and can be converted to HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and sqlx error mapping
//! ```
//!
//! # HTTP Response Conversion
//!
//! `BackendError` implements `IntoResponse`, so handlers return
//! `Result<_, BackendError>` and use `?`. The body is the standard failure
//! envelope `{ "success": false, "message": ..., "status": ... }`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::shared::ApiResponse;

/// Result type for handlers answering `200 OK` with an envelope
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, BackendError>;

/// Result type for handlers answering `201 Created` with an envelope
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), BackendError>;

/// Wrap a payload in a success envelope
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Wrap a payload in a success envelope with a message
pub fn ok_with<T: Serialize>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::with_message(message, data)))
}

/// `201 Created` with a message
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(message, data))))
}
