//! JWT token generation and verification.
//!
//! Tokens are HS256 only. Access and refresh tokens are signed with different
//! secrets, so one kind never verifies as the other.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::Deserialize;

use super::secrets::{SigningSecrets, TokenLifetimes};
use super::{AuthError, TokenError};
use crate::models::auth::{TOKEN_ISSUER, TokenClaims, User};

/// The only accepted `alg` header value.
const EXPECTED_ALG: &str = "HS256";

/// Which secret a token is signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// A freshly signed access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// Sign an access and a refresh token for `user`, valid from now.
pub fn issue_tokens(
    user: &User,
    secrets: &SigningSecrets,
    lifetimes: &TokenLifetimes,
) -> Result<TokenPair, TokenError> {
    issue_tokens_at(user, secrets, lifetimes, Utc::now())
}

/// Sign an access and a refresh token for `user` as of `now`.
pub fn issue_tokens_at(
    user: &User,
    secrets: &SigningSecrets,
    lifetimes: &TokenLifetimes,
    now: DateTime<Utc>,
) -> Result<TokenPair, TokenError> {
    let access_token = sign(user, TokenKind::Access, secrets, lifetimes, now)?;
    let refresh_token = sign(user, TokenKind::Refresh, secrets, lifetimes, now)?;
    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: lifetimes.access().num_seconds(),
    })
}

fn sign(
    user: &User,
    kind: TokenKind,
    secrets: &SigningSecrets,
    lifetimes: &TokenLifetimes,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let iat = now.timestamp();
    let exp = now
        .checked_add_signed(lifetimes.for_kind(kind))
        .ok_or(TokenError::ExpiryOutOfRange)?
        .timestamp();
    let claims = TokenClaims::for_user(user, iat, exp);
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        secrets.encoding_key(kind),
    )?)
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Read the `alg` field straight from the first token segment.
///
/// `jsonwebtoken` refuses to even parse headers declaring `none`, so the
/// algorithm check is done here to report it as a mismatch rather than as a
/// structural failure.
fn declared_algorithm(token: &str) -> Result<String, AuthError> {
    let segment = token
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::InvalidSignature)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::InvalidSignature)?;
    let header: RawHeader =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidSignature)?;
    Ok(header.alg)
}

/// Verify `token` as a `kind` token at unix time `now`.
///
/// Checks run in a fixed order so a tampered token never reveals anything
/// about its validity window: header, algorithm, signature and claims
/// structure, issuer, expiry, not-before.
pub fn validate_token(
    token: &str,
    kind: TokenKind,
    secrets: &SigningSecrets,
    now: i64,
) -> Result<TokenClaims, AuthError> {
    if declared_algorithm(token)? != EXPECTED_ALG {
        return Err(AuthError::AlgorithmMismatch);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation.set_issuer(&[TOKEN_ISSUER]);

    let claims = decode::<TokenClaims>(token, secrets.decoding_key(kind), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidAlgorithm => AuthError::AlgorithmMismatch,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            _ => AuthError::InvalidSignature,
        })?;

    if claims.exp <= now {
        return Err(AuthError::Expired);
    }
    if claims.iat > now || claims.nbf.is_some_and(|nbf| nbf > now) {
        return Err(AuthError::NotYetValid);
    }
    Ok(claims)
}
