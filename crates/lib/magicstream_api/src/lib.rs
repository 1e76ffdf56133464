//! # magicstream_api
//!
//! HTTP API library for MagicStream.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use magicstream_core::store::{MovieStore, UserStore};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, hello, movies};
use crate::services::auth::AuthContext;

/// Route paths.
pub mod routes {
    pub const GET_HELLO: &str = "/hello";
    pub const GET_MOVIES: &str = "/movies";
    pub const POST_REGISTER: &str = "/register";
    pub const POST_LOGIN: &str = "/login";
    pub const POST_REFRESH: &str = "/refresh";
    pub const GET_MOVIE: &str = "/movie/{imdb_id}";
    pub const POST_ADD_MOVIE: &str = "/addmovie";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User record store.
    pub users: Arc<dyn UserStore>,
    /// Movie record store.
    pub movies: Arc<dyn MovieStore>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    pub fn auth_context(&self) -> AuthContext<'_> {
        AuthContext {
            secrets: &self.config.secrets,
            lifetimes: &self.config.lifetimes,
            store_timeout: self.config.store_timeout,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `magicstream_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    magicstream_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HELLO, get(hello::hello_world))
        .route(routes::GET_MOVIES, get(movies::list_movies_handler))
        .route(routes::POST_REGISTER, post(auth::register_handler))
        .route(routes::POST_LOGIN, post(auth::login_handler))
        .route(routes::POST_REFRESH, post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_MOVIE, get(movies::get_movie_handler))
        .route(routes::POST_ADD_MOVIE, post(movies::add_movie_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
