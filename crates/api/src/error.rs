//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Every error body is JSON: `{"detail": ...}` for request-level errors and a
//! field-to-messages map for validation errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::validation::FieldErrors;

/// Body detail for failed logins.
pub const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request body failed validation.
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found")]
    NotFound,

    /// Page number out of range or malformed.
    #[error("Invalid page")]
    InvalidPage,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body is not JSON.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Validation(errors) => Self::Validation(errors),
            CartError::Repository(err) => Self::Database(err),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

fn detail(message: &str) -> Value {
    json!({ "detail": message })
}

impl AppError {
    /// Whether this error is the server's fault.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => !matches!(
                err,
                AuthError::InvalidCredentials
                    | AuthError::InvalidToken
                    | AuthError::InvalidUsername(_)
                    | AuthError::WeakPassword(_)
                    | AuthError::UserAlreadyExists
                    | AuthError::UserNotFound
                    | AuthError::UserInactive
            ),
            _ => false,
        }
    }

    fn status_and_body(&self) -> (StatusCode, Value) {
        if self.is_server_error() {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("Internal server error"),
            );
        }

        match self {
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, errors.to_value()),
            Self::NotFound => (StatusCode::NOT_FOUND, detail("Not found.")),
            Self::InvalidPage => (StatusCode::NOT_FOUND, detail("Invalid page.")),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, detail(message)),
            Self::UnsupportedMediaType(message) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, detail(message))
            }
            Self::Auth(err) => match err {
                AuthError::InvalidToken => (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "detail": "Token is invalid or expired",
                        "code": "token_not_valid",
                    }),
                ),
                AuthError::UserAlreadyExists => (
                    StatusCode::BAD_REQUEST,
                    FieldErrors::single("username", "A user with that username already exists.")
                        .to_value(),
                ),
                AuthError::WeakPassword(message) => (
                    StatusCode::BAD_REQUEST,
                    FieldErrors::single("password", message.clone()).to_value(),
                ),
                _ => (StatusCode::BAD_REQUEST, detail(INVALID_CREDENTIALS)),
            },
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("Internal server error"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for an authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}
