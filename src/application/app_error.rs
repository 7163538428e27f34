use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

#[derive(Error, Debug)]
pub enum AppError {
    /// A required entity could not be resolved. Nothing was written.
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// Persistence rejected the change. The transaction was rolled back.
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn validation(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(
            field,
            ValidationError::new(code).with_message(Cow::Borrowed(message)),
        );
        AppError::ValidationFailed(errors)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingArgument(_) => ErrorCode::MissingArgument,
            AppError::ValidationFailed(_) => ErrorCode::ValidationError,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Structured form handed back to callers.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            AppError::MissingArgument("customer") => "unable to find customer".to_string(),
            AppError::MissingArgument("plan") => "plan does not exist".to_string(),
            AppError::MissingArgument(arg) => format!("{arg} is required"),
            AppError::ValidationFailed(_) => "validation errors".to_string(),
            // Database details stay in the logs
            AppError::Database(_) => "database operation failed".to_string(),
            other => other.to_string(),
        };

        let details = match self {
            AppError::ValidationFailed(errors) => Some(errors.clone()),
            _ => None,
        };

        ErrorResponse {
            code: self.code().as_str(),
            message,
            details,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    MissingArgument,
    ValidationError,
    NotFound,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingArgument => "missing_argument",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::NotFound => "not_found",
            ErrorCode::DatabaseError => "database_error",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationErrors>,
}

pub type AppResult<T> = Result<T, AppError>;
