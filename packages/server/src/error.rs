use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`, `CONFLICT`,
    /// `USERNAME_TAKEN`, `STORAGE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "name: Name must be 1-40 characters")]
    pub message: String,
    /// Per-field messages, present for `VALIDATION_ERROR` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = json!({"name": ["Name must be 1-40 characters"]}))]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

/// Field name to list of messages, in field order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when nothing was recorded, otherwise `AppError::Validation`.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }

    fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationErrors),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    /// Also returned for rows owned by someone else.
    NotFound(String),
    Conflict(String),
    UsernameTaken,
    /// The blob store failed to read or write.
    Storage(String),
    Internal(String),
}

impl AppError {
    /// Validation failure on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }

    /// Report an unresolvable reference in a request body as a validation
    /// failure on `field` instead of a 404 for the whole request.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        match self {
            AppError::NotFound(msg) => AppError::invalid(field, msg),
            other => other,
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let plain = |code: &'static str, message: String| ErrorBody {
            code,
            message,
            fields: None,
        };

        match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: errors.summary(),
                    fields: Some(errors.0),
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                plain("TOKEN_MISSING", "Authentication required".into()),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                plain("TOKEN_INVALID", "Invalid or expired token".into()),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                plain("INVALID_CREDENTIALS", "Invalid username or password".into()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, plain("NOT_FOUND", msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, plain("CONFLICT", msg)),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                plain("USERNAME_TAKEN", "Username is already taken".into()),
            ),
            AppError::Storage(detail) => {
                tracing::error!("Storage error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    plain("STORAGE_ERROR", "File storage is unavailable".into()),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    plain("INTERNAL_ERROR", "An unexpected error occurred".into()),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".into()),
            StorageError::AlreadyExists(path) => {
                AppError::Conflict(format!("A file already exists at '{path}'"))
            }
            StorageError::InvalidPath(msg) => AppError::invalid("file", msg),
            StorageError::SizeLimitExceeded { limit, .. } => AppError::invalid(
                "file",
                format!("File exceeds maximum size of {limit} bytes"),
            ),
            StorageError::Io(e) => AppError::Storage(e.to_string()),
        }
    }
}
