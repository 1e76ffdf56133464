//! Movie catalogue handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use magicstream_core::models::movie::Movie;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::InsertResponse;
use crate::services::movies;

/// `GET /movies`: list the catalogue.
pub async fn list_movies_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Movie>>> {
    let resp = movies::list(state.movies.as_ref(), state.config.store_timeout).await?;
    Ok(Json(resp))
}

/// `GET /movie/{imdb_id}`: fetch one movie. Requires authentication.
pub async fn get_movie_handler(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> AppResult<Json<Movie>> {
    let resp = movies::get(state.movies.as_ref(), &imdb_id, state.config.store_timeout).await?;
    Ok(Json(resp))
}

/// `POST /addmovie`: add a movie. Requires authentication.
pub async fn add_movie_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<Movie>,
) -> AppResult<(StatusCode, Json<InsertResponse>)> {
    let resp = movies::add(
        state.movies.as_ref(),
        body,
        &user.user_id,
        state.config.store_timeout,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
