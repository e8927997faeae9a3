/**
 * Backend Error Types
 *
 * This module defines the error type returned by HTTP handlers and the
 * server bootstrap. Every variant maps to an HTTP status code so handlers
 * can return `Result<_, BackendError>` and let the conversion in
 * `conversion.rs` build the response.
 *
 * # Error Categories
 *
 * - `HandlerError` - request-level failures carrying their own status
 *   (bad input, unauthorized, forbidden, not found, conflict)
 * - `DatabaseError` - anything coming out of `sqlx`
 * - `TokenError` - JWT encoding or validation failures (always 401)
 * - `PasswordError` - bcrypt failures
 * - `SharedError` / `SerializationError` - wire-level failures
 * - `Migration` - schema migration failures at startup
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use chathub::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let err = BackendError::conflict("Username or email already exists");
/// assert_eq!(err.status_code(), StatusCode::CONFLICT);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., invalid body, missing credentials)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Database error
    ///
    /// The underlying message is logged but never returned to the client.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Token could not be issued or validated
    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    /// Password hashing or verification failed
    #[error("Password error: {0}")]
    PasswordError(#[from] bcrypt::BcryptError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::CONFLICT, message)
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `TokenError` - 401 Unauthorized
    /// - `SharedError` - 400 for validation errors, 500 otherwise
    /// - everything else - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::TokenError(_) => StatusCode::UNAUTHORIZED,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::DatabaseError(_)
            | Self::PasswordError(_)
            | Self::SerializationError(_)
            | Self::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client
    ///
    /// Internal failures collapse to a generic message so database or
    /// hashing details never leak into responses.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::TokenError(_) => "Invalid token".to_string(),
            Self::SharedError(err) => err.to_string(),
            Self::DatabaseError(_)
            | Self::PasswordError(_)
            | Self::SerializationError(_)
            | Self::Migration(_) => "Internal server error".to_string(),
        }
    }
}
