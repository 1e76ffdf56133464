//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use magicstream_core::auth::password::HashingError;
use magicstream_core::auth::{AuthError, TokenError};
use magicstream_core::store::StoreError;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Message shown for every rejected login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Message shown for every rejected bearer or refresh token.
pub const UNAUTHORIZED: &str = "Invalid or missing authentication token";

/// Why a login attempt failed. Never exposed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    UnknownEmail,
    WrongPassword,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials ({0:?})")]
    InvalidCredentials(LoginFailure),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Status code and stable machine-readable error code.
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidCredentials(_) | AppError::Unauthorized(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AppError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let message = match &self {
            AppError::Validation(m) | AppError::Conflict(m) | AppError::NotFound(m) => m.as_str(),
            AppError::InvalidCredentials(reason) => {
                debug!(?reason, "login rejected");
                INVALID_CREDENTIALS
            }
            AppError::Unauthorized(reason) => {
                debug!(%reason, "authentication rejected");
                UNAUTHORIZED
            }
            AppError::StoreUnavailable(detail) => {
                error!(%detail, "store unavailable");
                "Service temporarily unavailable"
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                "Internal server error"
            }
        };
        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::Duplicate(what) => AppError::Conflict(what),
            StoreError::Timeout(_) => AppError::StoreUnavailable(e.to_string()),
            StoreError::DbError(e) => match e {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    AppError::StoreUnavailable(e.to_string())
                }
                _ => AppError::Internal(e.to_string()),
            },
        }
    }
}

impl From<HashingError> for AppError {
    fn from(e: HashingError) -> Self {
        match e {
            HashingError::TooLong(_) => AppError::Validation(e.to_string()),
            HashingError::Bcrypt(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        AppError::Internal(e.to_string())
    }
}
