//! Signing secrets and token lifetimes.
//!
//! Both are loaded once at startup and shared read-only afterwards. A missing
//! secret is a [`ConfigError`]; the process must not start serving without
//! one.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{DecodingKey, EncodingKey};

use super::ConfigError;
use super::jwt::TokenKind;

/// Environment variable holding the access-token secret.
pub const ACCESS_SECRET_VAR: &str = "SECRET_KEY";
/// Environment variable holding the refresh-token secret.
pub const REFRESH_SECRET_VAR: &str = "SECRET_REFRESH_KEY";
/// Optional override for the access-token lifetime, in seconds.
pub const ACCESS_TTL_VAR: &str = "ACCESS_TOKEN_TTL_SECS";
/// Optional override for the refresh-token lifetime, in seconds.
pub const REFRESH_TTL_VAR: &str = "REFRESH_TOKEN_TTL_SECS";

/// Default access-token lifetime: 24 hours.
const DEFAULT_ACCESS_TTL_SECS: i64 = 24 * 60 * 60;
/// Default refresh-token lifetime: 7 days.
const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * DEFAULT_ACCESS_TTL_SECS;
/// Upper bound for either lifetime: 10 years.
const MAX_TTL_SECS: i64 = 10 * 365 * DEFAULT_ACCESS_TTL_SECS;

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

struct Keys {
    access: KeyPair,
    refresh: KeyPair,
}

/// HMAC keys for access and refresh tokens. Cheap to clone.
#[derive(Clone)]
pub struct SigningSecrets {
    keys: Arc<Keys>,
}

impl SigningSecrets {
    /// Build from explicit secret values.
    ///
    /// Blank secrets and a secret shared between both token kinds are
    /// rejected.
    pub fn new(access: &str, refresh: &str) -> Result<Self, ConfigError> {
        if access.trim().is_empty() {
            return Err(ConfigError::MissingSecret(ACCESS_SECRET_VAR));
        }
        if refresh.trim().is_empty() {
            return Err(ConfigError::MissingSecret(REFRESH_SECRET_VAR));
        }
        if access == refresh {
            return Err(ConfigError::SharedSecret);
        }
        Ok(Self {
            keys: Arc::new(Keys {
                access: KeyPair::from_secret(access),
                refresh: KeyPair::from_secret(refresh),
            }),
        })
    }

    /// Read `SECRET_KEY` and `SECRET_REFRESH_KEY` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the secrets through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access = lookup(ACCESS_SECRET_VAR).unwrap_or_default();
        let refresh = lookup(REFRESH_SECRET_VAR).unwrap_or_default();
        Self::new(&access, &refresh)
    }

    pub(crate) fn encoding_key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.keys.access.encoding,
            TokenKind::Refresh => &self.keys.refresh.encoding,
        }
    }

    pub(crate) fn decoding_key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.keys.access.decoding,
            TokenKind::Refresh => &self.keys.refresh.decoding,
        }
    }
}

impl fmt::Debug for SigningSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecrets").finish_non_exhaustive()
    }
}

/// How long each kind of token stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    access: Duration,
    refresh: Duration,
}

impl TokenLifetimes {
    /// Access tokens must be positive and strictly shorter-lived than
    /// refresh tokens. Neither may exceed ten years.
    pub fn new(access: Duration, refresh: Duration) -> Result<Self, ConfigError> {
        if access <= Duration::zero() {
            return Err(ConfigError::InvalidLifetime(
                "access token lifetime must be positive".into(),
            ));
        }
        if refresh > Duration::seconds(MAX_TTL_SECS) {
            return Err(ConfigError::InvalidLifetime(format!(
                "refresh lifetime ({}s) exceeds the {MAX_TTL_SECS}s maximum",
                refresh.num_seconds()
            )));
        }
        if access >= refresh {
            return Err(ConfigError::InvalidLifetime(format!(
                "access lifetime ({}s) must be shorter than refresh lifetime ({}s)",
                access.num_seconds(),
                refresh.num_seconds()
            )));
        }
        Ok(Self { access, refresh })
    }

    /// Read `ACCESS_TOKEN_TTL_SECS` / `REFRESH_TOKEN_TTL_SECS`, falling back
    /// to 24 hours and 7 days.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the lifetimes through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access = parse_secs(ACCESS_TTL_VAR, lookup(ACCESS_TTL_VAR), DEFAULT_ACCESS_TTL_SECS)?;
        let refresh = parse_secs(
            REFRESH_TTL_VAR,
            lookup(REFRESH_TTL_VAR),
            DEFAULT_REFRESH_TTL_SECS,
        )?;
        Self::new(
            seconds(ACCESS_TTL_VAR, access)?,
            seconds(REFRESH_TTL_VAR, refresh)?,
        )
    }

    pub fn access(&self) -> Duration {
        self.access
    }

    pub fn refresh(&self) -> Duration {
        self.refresh
    }

    pub fn for_kind(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access,
            TokenKind::Refresh => self.refresh,
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
        }
    }
}

fn seconds(var: &'static str, secs: i64) -> Result<Duration, ConfigError> {
    Duration::try_seconds(secs).ok_or_else(|| ConfigError::InvalidValue {
        var,
        reason: format!("{secs} seconds is out of range"),
    })
}

fn parse_secs(var: &'static str, raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<i64>().map_err(|e| ConfigError::InvalidValue {
            var,
            reason: format!("'{value}': {e}"),
        }),
    }
}
