//! Authentication service: register, login and refresh flows on top of
//! `magicstream_core::auth`.

use std::time::Duration;

use chrono::Utc;
use magicstream_core::auth::AuthError;
use magicstream_core::auth::jwt::{TokenKind, issue_tokens_at, validate_token};
use magicstream_core::auth::password::{
    MAX_PASSWORD_BYTES, burn_verification, hash_password, verify_password,
};
use magicstream_core::auth::secrets::{SigningSecrets, TokenLifetimes};
use magicstream_core::auth::tokens::persist_tokens;
use magicstream_core::models::auth::{User, UserRecord};
use magicstream_core::store::{StoreError, UserStore, bounded};
use magicstream_core::uuid::new_user_id;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, LoginFailure};
use crate::models::{InsertResponse, LoginRequest, RegisterRequest, UserResponse};

/// Everything the token-issuing flows need besides the store.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext<'a> {
    pub secrets: &'a SigningSecrets,
    pub lifetimes: &'a TokenLifetimes,
    pub store_timeout: Duration,
}

// ---------------------------------------------------------------------------
// Password hashing (off the async runtime)
// ---------------------------------------------------------------------------

async fn hash_blocking(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hash task: {e}")))?
        .map_err(AppError::from)
}

async fn verify_blocking(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verify task: {e}")))?
        .map_err(AppError::from)
}

async fn burn_blocking(password: String) -> AppResult<()> {
    tokio::task::spawn_blocking(move || burn_verification(&password))
        .await
        .map_err(|e| AppError::Internal(format!("verify task: {e}")))
}

// ---------------------------------------------------------------------------
// Request validation
// ---------------------------------------------------------------------------

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn validate_registration(body: &RegisterRequest) -> AppResult<()> {
    let mut problems = Vec::new();
    if body.first_name.trim().is_empty() {
        problems.push("firstName is required");
    }
    if body.last_name.trim().is_empty() {
        problems.push("lastName is required");
    }
    if !is_plausible_email(&body.email) {
        problems.push("email must be a valid address");
    }
    if body.password.is_empty() {
        problems.push("password is required");
    } else if body.password.len() > MAX_PASSWORD_BYTES {
        problems.push("password must be at most 72 bytes");
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join("; ")))
    }
}

// ---------------------------------------------------------------------------
// Token issuance
// ---------------------------------------------------------------------------

/// Issue a fresh pair for `user`, persist it, and build the response.
///
/// Nothing is persisted if signing fails.
async fn issue_and_persist(
    store: &dyn UserStore,
    user: User,
    ctx: AuthContext<'_>,
) -> AppResult<UserResponse> {
    let now = Utc::now();
    let pair = issue_tokens_at(&user, ctx.secrets, ctx.lifetimes, now)?;
    persist_tokens(store, &user.user_id, &pair, now, ctx.store_timeout)
        .await
        .map_err(|e| match e {
            // The user was resolved moments ago; losing it now is a bug.
            StoreError::NotFound(what) => {
                AppError::Internal(format!("token persistence lost user: {what}"))
            }
            other => AppError::from(other),
        })?;
    Ok(UserResponse::new(user, pair.access_token, pair.refresh_token))
}

// ---------------------------------------------------------------------------
// Public auth operations
// ---------------------------------------------------------------------------

/// Register a new user account with an empty token record.
pub async fn register(
    store: &dyn UserStore,
    body: RegisterRequest,
    store_timeout: Duration,
) -> AppResult<InsertResponse> {
    validate_registration(&body)?;

    if bounded(store_timeout, store.email_exists(&body.email)).await? {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_blocking(body.password).await?;
    let user = User {
        user_id: new_user_id(),
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        role: body.role,
        favourite_genres: body.favourite_genres,
    };
    let record = UserRecord::new(user, password_hash, Utc::now());

    let inserted_id = bounded(store_timeout, store.insert_user(&record))
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration for the same email.
            StoreError::Duplicate(_) => AppError::Conflict("User already exists".into()),
            other => AppError::from(other),
        })?;

    info!(user_id = %inserted_id, role = %record.user.role, "user registered");
    Ok(InsertResponse { inserted_id })
}

/// Authenticate with email + password and issue a token pair.
///
/// Unknown email and wrong password produce the same response and cost the
/// same bcrypt work.
pub async fn login(
    store: &dyn UserStore,
    body: LoginRequest,
    ctx: AuthContext<'_>,
) -> AppResult<UserResponse> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(AppError::Validation("email and password are required".into()));
    }

    let found = bounded(ctx.store_timeout, store.find_by_email(&body.email)).await?;

    let record = match found {
        None => {
            burn_blocking(body.password).await?;
            return Err(AppError::InvalidCredentials(LoginFailure::UnknownEmail));
        }
        Some(r) => r,
    };

    if !verify_blocking(body.password, record.password_hash).await? {
        return Err(AppError::InvalidCredentials(LoginFailure::WrongPassword));
    }

    let response = issue_and_persist(store, record.user, ctx).await?;
    info!(user_id = %response.user_id, "user logged in");
    Ok(response)
}

/// Exchange the current refresh token for a new pair.
///
/// The token must verify under the refresh secret and be the one persisted
/// for its user; an older refresh token stops working once a newer pair is
/// issued.
pub async fn refresh(
    store: &dyn UserStore,
    refresh_token: &str,
    ctx: AuthContext<'_>,
) -> AppResult<UserResponse> {
    if refresh_token.is_empty() {
        return Err(AuthError::MissingToken.into());
    }
    let claims = validate_token(
        refresh_token,
        TokenKind::Refresh,
        ctx.secrets,
        Utc::now().timestamp(),
    )?;

    let record = bounded(ctx.store_timeout, store.find_by_id(&claims.user_id))
        .await?
        .ok_or(AppError::Unauthorized(AuthError::InvalidSignature))?;

    if record.refresh_token != refresh_token {
        warn!(user_id = %claims.user_id, "refresh token is not the latest issued");
        return Err(AuthError::InvalidSignature.into());
    }

    issue_and_persist(store, record.user, ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("a@b.com"));
        assert!(!is_plausible_email("ab.com"));
        assert!(!is_plausible_email("@b.com"));
        assert!(!is_plausible_email("a@"));
        assert!(!is_plausible_email("a b@c.com"));
        assert!(!is_plausible_email("a@b@c"));
    }

    #[test]
    fn registration_rejects_passwords_bcrypt_would_truncate() {
        let body = RegisterRequest {
            first_name: "F".into(),
            last_name: "L".into(),
            email: "f@l.com".into(),
            password: "p".repeat(MAX_PASSWORD_BYTES + 1),
            role: Default::default(),
            favourite_genres: vec![],
        };
        match validate_registration(&body) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("72 bytes")),
            other => panic!("expected validation error, got {other:?}"),
        }

        let at_limit = RegisterRequest {
            password: "p".repeat(MAX_PASSWORD_BYTES),
            ..body
        };
        assert!(validate_registration(&at_limit).is_ok());
    }

    #[test]
    fn registration_collects_all_problems() {
        let body = RegisterRequest {
            first_name: String::new(),
            last_name: "L".into(),
            email: "nope".into(),
            password: String::new(),
            role: Default::default(),
            favourite_genres: vec![],
        };
        match validate_registration(&body) {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("firstName"));
                assert!(msg.contains("email"));
                assert!(msg.contains("password"));
                assert!(!msg.contains("lastName"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
