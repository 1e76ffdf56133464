//! Authentication and authorization logic.
//!
//! Password hashing, signing-secret configuration, token issuance and
//! validation, and persistence of the latest issued token pair. Everything
//! here except [`tokens`] is pure and safe to call from any number of
//! concurrent requests.

pub mod bearer;
pub mod jwt;
pub mod password;
pub mod secrets;
pub mod tokens;

use thiserror::Error;

/// Reasons a presented access token is rejected.
///
/// Callers turn every variant into the same unauthorized response; the
/// variant itself is for logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no bearer token presented")]
    MissingToken,

    #[error("authorization header is not of the form 'Bearer <token>'")]
    MalformedHeader,

    #[error("token structure or signature is invalid")]
    InvalidSignature,

    #[error("token declares an unexpected signing algorithm")]
    AlgorithmMismatch,

    #[error("token issuer is not recognised")]
    InvalidIssuer,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,
}

/// Startup configuration errors. Never recovered from.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set or empty")]
    MissingSecret(&'static str),

    #[error("access and refresh signing secrets must differ")]
    SharedSecret,

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("invalid token lifetimes: {0}")]
    InvalidLifetime(String),
}

/// Token signing failures.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt encode: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
}
