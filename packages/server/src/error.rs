use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde_json::json;

use crate::models::shared::Envelope;
use crate::store::StoreError;

/// Application-level error type.
///
/// Every variant renders as the standard response envelope with `data: null`
/// and `error: { "code": ... }`.
#[derive(Debug)]
pub enum AppError {
    /// Malformed, missing or inconsistent input. Raised before any storage or
    /// blob mutation.
    Validation(String),
    /// A referenced collection or entry does not resolve.
    NotFound(String),
    /// Duplicate natural key.
    Conflict(String),
    /// Blob store or persistence failure during a required phase.
    Dependency(String),
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
}

impl AppError {
    fn status_code_and_message(self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            // Duplicate keys share the 400 status with validation failures.
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, "CONFLICT", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Dependency(detail) => {
                tracing::error!("Dependency failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DEPENDENCY_ERROR",
                    "A storage dependency failed while processing the request".into(),
                )
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Unauthorized - No token provided".into(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Unauthorized - Invalid token".into(),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Forbidden - Admins only".into(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.status_code_and_message();
        let body = Envelope::<()> {
            success: false,
            message,
            data: None,
            error: json!({ "code": code }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Dependency(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds the {limit} byte upload limit."))
            }
            other => AppError::Dependency(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(key) => key.family().duplicate(&key),
            StoreError::NotFound(_) => AppError::NotFound("Collection not found.".into()),
            other => AppError::Dependency(other.to_string()),
        }
    }
}
