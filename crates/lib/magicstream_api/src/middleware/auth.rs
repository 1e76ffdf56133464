//! Authentication middleware: Bearer token extraction and JWT verification.
//!
//! Every protected request goes through [`require_auth`]. It either attaches
//! an [`AuthenticatedUser`] to the request extensions and hands the request
//! on, or answers 401 without running the handler. Nothing outside the
//! request is touched.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use magicstream_core::auth::AuthError;
use magicstream_core::auth::bearer::validate_at;
use magicstream_core::auth::secrets::SigningSecrets;
use magicstream_core::models::auth::{Role, TokenClaims};
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Identity established for the current request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
    pub claims: TokenClaims,
}

impl From<TokenClaims> for AuthenticatedUser {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id.clone(),
            role: claims.role,
            claims,
        }
    }
}

/// Establish identity from request headers at unix time `now`.
///
/// An absent header is treated as an empty one; a header that is not
/// visible ASCII cannot carry a bearer token and is malformed.
pub fn authenticate(
    headers: &HeaderMap,
    secrets: &SigningSecrets,
    now: i64,
) -> Result<AuthenticatedUser, AuthError> {
    let raw = match headers.get(AUTHORIZATION) {
        None => "",
        Some(value) => value.to_str().map_err(|_| AuthError::MalformedHeader)?,
    };
    let claims = validate_at(raw, secrets, now)?;
    Ok(AuthenticatedUser::from(claims))
}

/// Axum middleware: verifies `Authorization: Bearer <token>` and injects
/// `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(
        request.headers(),
        &state.config.secrets,
        Utc::now().timestamp(),
    )?;

    debug!(user_id = %user.user_id, role = %user.role, "request authenticated");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
