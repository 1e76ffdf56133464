//! Movie catalogue models.

use serde::{Deserialize, Serialize};

/// A genre tag attached to a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub genre_id: i32,
    pub genre_name: String,
}

/// Editorial ranking of a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub ranking_value: i32,
    pub ranking_name: String,
}

/// A movie in the catalogue, keyed by its IMDb id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub imdb_id: String,
    pub title: String,
    #[serde(default)]
    pub poster_path: String,
    #[serde(default)]
    pub youtube_id: String,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub admin_review: String,
    pub ranking: Ranking,
}

impl Movie {
    /// Field-level checks for a movie submitted through the API.
    /// Returns a list of validation messages (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.imdb_id.trim().is_empty() {
            errors.push("imdbId is required".to_string());
        }
        if self.title.trim().is_empty() {
            errors.push("title is required".to_string());
        }
        if self.ranking.ranking_name.trim().is_empty() {
            errors.push("ranking.rankingName is required".to_string());
        }
        if self.genres.iter().any(|g| g.genre_name.trim().is_empty()) {
            errors.push("genres must have a genreName".to_string());
        }
        errors
    }
}
