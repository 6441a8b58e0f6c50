use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::LoginError;
use crate::compose::ComposeError;
use crate::selection::SelectionError;
use crate::store::StoreError;
use crate::validation::FormValidation;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A form failed validation; carries the mirrored error structure.
    #[error("Invalid form")]
    InvalidForm(Value),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_form<E: Serialize>(validation: &FormValidation<E>) -> Self {
        match serde_json::to_value(validation) {
            Ok(details) => AppError::InvalidForm(details),
            Err(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => AppError::Validation(err.to_string()),
            StoreError::NotFound => AppError::NotFound("Record not found".to_string()),
            StoreError::Forbidden => AppError::Forbidden,
            StoreError::Rejected(body) => AppError::Validation(body),
            StoreError::Unavailable(_) | StoreError::Backend(_) | StoreError::Decode(_) => {
                AppError::Backend(err.to_string())
            }
        }
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidForm(validation) => AppError::invalid_form(&validation),
            LoginError::InvalidCredentials => AppError::InvalidCredentials,
            LoginError::Store(e) => e.into(),
        }
    }
}

impl From<ComposeError> for AppError {
    fn from(err: ComposeError) -> Self {
        AppError::UnprocessableEntity(err.to_string())
    }
}

impl From<SelectionError> for AppError {
    fn from(err: SelectionError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::InvalidForm(errors) => {
                details = Some(errors);
                (
                    StatusCode::BAD_REQUEST,
                    "INVALID_FORM",
                    "One or more fields are invalid".to_string(),
                )
            }
            AppError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE_ENTITY", msg)
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Backend(msg) => {
                tracing::error!("Backend error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_ERROR",
                    "The data service could not complete the request".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
