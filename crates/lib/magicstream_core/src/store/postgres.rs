//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use super::{MovieStore, StoreError, UserStore};
use crate::models::auth::{Role, TokenRecord, User, UserRecord};
use crate::models::movie::{Genre, Movie, Ranking};

const USER_COLUMNS: &str = "user_id, first_name, last_name, email, password_hash, role, \
     favourite_genres, token, refresh_token, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: String,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    role: String,
    favourite_genres: Vec<String>,
    token: String,
    refresh_token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::DbError(sqlx::Error::Decode(e.into())))?;
        Ok(UserRecord {
            user: User {
                user_id: row.user_id,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                role,
                favourite_genres: row.favourite_genres,
            },
            password_hash: row.password_hash,
            token: row.token,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Map a unique-constraint violation to [`StoreError::Duplicate`].
fn map_insert_error(e: sqlx::Error, what: String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what),
        _ => StoreError::DbError(e),
    }
}

/// Users table access.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRecord::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.fetch_one_where("email", email).await
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        self.fetch_one_where("user_id", user_id).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<String, StoreError> {
        let user = &record.user;
        sqlx::query_scalar::<_, String>(
            "INSERT INTO users (user_id, first_name, last_name, email, password_hash, role, \
             favourite_genres, token, refresh_token, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING user_id",
        )
        .bind(&user.user_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&record.password_hash)
        .bind(user.role.as_str())
        .bind(&user.favourite_genres)
        .bind(&record.token)
        .bind(&record.refresh_token)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, format!("email {} already registered", user.email)))
    }

    async fn update_tokens(&self, user_id: &str, tokens: &TokenRecord) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET token = $2, refresh_token = $3, updated_at = $4 \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(&tokens.token)
        .bind(&tokens.refresh_token)
        .bind(tokens.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    imdb_id: String,
    title: String,
    poster_path: String,
    youtube_id: String,
    genres: Json<Vec<Genre>>,
    admin_review: String,
    ranking: Json<Ranking>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            imdb_id: row.imdb_id,
            title: row.title,
            poster_path: row.poster_path,
            youtube_id: row.youtube_id,
            genres: row.genres.0,
            admin_review: row.admin_review,
            ranking: row.ranking.0,
        }
    }
}

/// Movies table access.
#[derive(Debug, Clone)]
pub struct PgMovieStore {
    pool: PgPool,
}

impl PgMovieStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let rows = sqlx::query_as::<_, MovieRow>(
            "SELECT imdb_id, title, poster_path, youtube_id, genres, admin_review, ranking \
             FROM movies ORDER BY imdb_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn find_movie(&self, imdb_id: &str) -> Result<Option<Movie>, StoreError> {
        let row = sqlx::query_as::<_, MovieRow>(
            "SELECT imdb_id, title, poster_path, youtube_id, genres, admin_review, ranking \
             FROM movies WHERE imdb_id = $1",
        )
        .bind(imdb_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Movie::from))
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<String, StoreError> {
        sqlx::query_scalar::<_, String>(
            "INSERT INTO movies (imdb_id, title, poster_path, youtube_id, genres, admin_review, ranking) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING imdb_id",
        )
        .bind(&movie.imdb_id)
        .bind(&movie.title)
        .bind(&movie.poster_path)
        .bind(&movie.youtube_id)
        .bind(Json(&movie.genres))
        .bind(&movie.admin_review)
        .bind(Json(&movie.ranking))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, format!("movie {} already exists", movie.imdb_id)))
    }
}
