//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{InsertResponse, LoginRequest, RefreshRequest, RegisterRequest, UserResponse};
use crate::services::auth;

/// `POST /login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<UserResponse>> {
    let resp = auth::login(state.users.as_ref(), body, state.auth_context()).await?;
    Ok(Json(resp))
}

/// `POST /register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<InsertResponse>)> {
    let resp = auth::register(state.users.as_ref(), body, state.config.store_timeout).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /refresh`: exchange the latest refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<UserResponse>> {
    let resp = auth::refresh(
        state.users.as_ref(),
        &body.refresh_token,
        state.auth_context(),
    )
    .await?;
    Ok(Json(resp))
}
