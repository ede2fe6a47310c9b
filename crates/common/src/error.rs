//! Error types for quill.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Message shown to clients instead of server error details.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Your account has been blocked. Please contact the administrator.")]
    AccountBlocked,

    #[error("{0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("No comments selected.")]
    NothingSelected,

    #[error("Cannot delete category \"{0}\" because it has associated blog posts.")]
    CategoryInUse(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Session store error: {0}")]
    Session(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountBlocked | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) | Self::Duplicate(_) | Self::NothingSelected => {
                StatusCode::BAD_REQUEST
            }
            Self::CategoryInUse(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Database(_)
            | Self::Session(_)
            | Self::Storage(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountBlocked => "ACCOUNT_BLOCKED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Duplicate(_) => "DUPLICATE",
            Self::NothingSelected => "NOTHING_SELECTED",
            Self::CategoryInUse(_) => "CATEGORY_IN_USE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Session(_) => "SESSION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to the client.
    ///
    /// Server errors never leak their detail; it only goes to the log.
    #[must_use]
    pub fn client_message(&self) -> String {
        if self.is_server_error() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": self.client_message(),
            "code": code,
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Duplicate("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NothingSelected.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AccountBlocked.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::CategoryInUse("Tech".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_blocked_message_is_distinct_from_invalid_credentials() {
        assert_ne!(
            AppError::AccountBlocked.to_string(),
            AppError::InvalidCredentials.to_string()
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database("relation \"post\" does not exist".into());
        assert_eq!(err.client_message(), GENERIC_ERROR_MESSAGE);

        let err = AppError::Validation("Comment content cannot be empty.".into());
        assert_eq!(err.client_message(), "Comment content cannot be empty.");
    }

    #[test]
    fn test_category_in_use_message() {
        let err = AppError::CategoryInUse("Tech".into());
        assert_eq!(
            err.to_string(),
            "Cannot delete category \"Tech\" because it has associated blog posts."
        );
    }
}
