//! In-memory stores backed by `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{MovieStore, StoreError, UserStore};
use crate::models::auth::{TokenRecord, UserRecord};
use crate::models::movie::Movie;

/// Users keyed by id, with a unique email index.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserRecord>,
    emails: DashMap<String, String>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let Some(user_id) = self.emails.get(email).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|r| r.value().clone()))
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(user_id).map(|r| r.value().clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.emails.contains_key(email))
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<String, StoreError> {
        let user_id = record.user.user_id.clone();
        match self.emails.entry(record.user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "email {} already registered",
                record.user.email
            ))),
            Entry::Vacant(slot) => {
                self.users.insert(user_id.clone(), record.clone());
                slot.insert(user_id.clone());
                Ok(user_id)
            }
        }
    }

    async fn update_tokens(&self, user_id: &str, tokens: &TokenRecord) -> Result<u64, StoreError> {
        match self.users.get_mut(user_id) {
            Some(mut record) => {
                record.apply_tokens(tokens);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

/// Movies keyed by IMDb id.
#[derive(Debug, Default)]
pub struct MemoryMovieStore {
    movies: DashMap<String, Movie>,
}

impl MemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let mut movies: Vec<Movie> = self.movies.iter().map(|m| m.value().clone()).collect();
        movies.sort_by(|a, b| a.imdb_id.cmp(&b.imdb_id));
        Ok(movies)
    }

    async fn find_movie(&self, imdb_id: &str) -> Result<Option<Movie>, StoreError> {
        Ok(self.movies.get(imdb_id).map(|m| m.value().clone()))
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<String, StoreError> {
        match self.movies.entry(movie.imdb_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "movie {} already exists",
                movie.imdb_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(movie.clone());
                Ok(movie.imdb_id.clone())
            }
        }
    }
}
