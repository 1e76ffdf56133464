//! Record stores for users and movies.
//!
//! The traits are the only surface the rest of the workspace sees. Two
//! implementations exist: [`postgres`] for the real service and [`memory`]
//! for tests and local runs without a database.

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{TokenRecord, UserRecord};
use crate::models::movie::Movie;

/// Upper bound on a single store round-trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(100);

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Run a store operation under a timeout.
///
/// The wrapped future is dropped on expiry, which cancels the in-flight call.
/// Nothing is retried.
pub async fn bounded<T, F>(limit: Duration, op: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

/// User record persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look up a user by id.
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Whether an account with this email exists.
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert a new user. Fails with [`StoreError::Duplicate`] if the email is
    /// taken. Returns the user id.
    async fn insert_user(&self, record: &UserRecord) -> Result<String, StoreError>;

    /// Replace the token record of `user_id` in one write. Returns the number
    /// of records matched.
    async fn update_tokens(&self, user_id: &str, tokens: &TokenRecord) -> Result<u64, StoreError>;
}

/// Movie catalogue persistence.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError>;

    async fn find_movie(&self, imdb_id: &str) -> Result<Option<Movie>, StoreError>;

    /// Insert a movie. Fails with [`StoreError::Duplicate`] if the IMDb id is
    /// taken. Returns the IMDb id.
    async fn insert_movie(&self, movie: &Movie) -> Result<String, StoreError>;
}
