//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! bodies in `magicstream_api::models`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issuer claim stamped into every token.
pub const TOKEN_ISSUER: &str = "MagicStream";

/// User role. Authorization beyond identity is left to handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Domain identity: the subset of a user record the auth core reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub favourite_genres: Vec<String>,
}

/// Latest issued token pair, persisted on the owning user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub token: String,
    pub refresh_token: String,
    pub updated_at: DateTime<Utc>,
}

/// Full user record as held by a [`UserStore`](crate::store::UserStore).
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
    pub token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// A freshly registered user: empty token record, both timestamps `now`.
    pub fn new(user: User, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            user,
            password_hash,
            token: String::new(),
            refresh_token: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the token record fields wholesale.
    pub fn apply_tokens(&mut self, record: &TokenRecord) {
        self.token = record.token.clone();
        self.refresh_token = record.refresh_token.clone();
        self.updated_at = record.updated_at;
    }
}

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub user_id: String,
    /// Issuer, always [`TOKEN_ISSUER`].
    pub iss: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Not before (unix timestamp). Never minted here, honoured if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl TokenClaims {
    /// Build claims for `user` valid from `iat` until `exp`.
    pub fn for_user(user: &User, iat: i64, exp: i64) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            user_id: user.user_id.clone(),
            iss: TOKEN_ISSUER.to_string(),
            iat,
            exp,
            nbf: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("USER".parse::<Role>(), Ok(Role::User));
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn claims_serialize_with_registered_names() {
        let user = User {
            user_id: "u1".into(),
            email: "a@b.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            role: Role::User,
            favourite_genres: vec![],
        };
        let json = serde_json::to_value(TokenClaims::for_user(&user, 10, 20)).unwrap();
        assert_eq!(json["iss"], "MagicStream");
        assert_eq!(json["iat"], 10);
        assert_eq!(json["exp"], 20);
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["role"], "USER");
        assert!(json.get("nbf").is_none());
    }
}
