//! `Authorization: Bearer <token>` parsing and access-token validation.

use chrono::Utc;

use super::AuthError;
use super::jwt::{TokenKind, validate_token};
use super::secrets::SigningSecrets;
use crate::models::auth::TokenClaims;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from a raw `Authorization` header value.
///
/// The scheme is case-sensitive and must be followed by exactly one space.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    if header.is_empty() {
        return Err(AuthError::MissingToken);
    }
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedHeader)?;
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    if token.starts_with(char::is_whitespace) {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Validate a raw `Authorization` header value as an access token.
pub fn validate(header: &str, secrets: &SigningSecrets) -> Result<TokenClaims, AuthError> {
    validate_at(header, secrets, Utc::now().timestamp())
}

/// Same as [`validate`] against a fixed unix time.
pub fn validate_at(
    header: &str,
    secrets: &SigningSecrets,
    now: i64,
) -> Result<TokenClaims, AuthError> {
    let token = parse_bearer(header)?;
    validate_token(token, TokenKind::Access, secrets, now)
}
