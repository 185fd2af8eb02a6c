//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] saraphan_core::UsernameError),

    /// Wrong password, unknown username, or inactive account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The token's user no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// The token's user has been deactivated.
    #[error("user is inactive")]
    UserInactive,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Token is malformed, badly signed, expired, or of the wrong type.
    #[error("token is invalid or expired")]
    InvalidToken,

    /// Token could not be signed.
    #[error("token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
