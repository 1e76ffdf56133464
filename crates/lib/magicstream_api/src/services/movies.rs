//! Movie catalogue service.

use std::time::Duration;

use magicstream_core::models::movie::Movie;
use magicstream_core::store::{MovieStore, bounded};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::InsertResponse;

/// All movies, ordered by IMDb id.
pub async fn list(store: &dyn MovieStore, timeout: Duration) -> AppResult<Vec<Movie>> {
    Ok(bounded(timeout, store.list_movies()).await?)
}

/// One movie by IMDb id.
pub async fn get(store: &dyn MovieStore, imdb_id: &str, timeout: Duration) -> AppResult<Movie> {
    if imdb_id.trim().is_empty() {
        return Err(AppError::Validation("Movie ID is required".into()));
    }
    bounded(timeout, store.find_movie(imdb_id))
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

/// Validate and insert a movie on behalf of `added_by`.
pub async fn add(
    store: &dyn MovieStore,
    movie: Movie,
    added_by: &str,
    timeout: Duration,
) -> AppResult<InsertResponse> {
    let problems = movie.validate();
    if !problems.is_empty() {
        return Err(AppError::Validation(problems.join("; ")));
    }
    let inserted_id = bounded(timeout, store.insert_movie(&movie)).await?;
    info!(imdb_id = %inserted_id, added_by, "movie added");
    Ok(InsertResponse { inserted_id })
}
