//! API server configuration.

use std::time::Duration;

use magicstream_core::auth::ConfigError;
use magicstream_core::auth::secrets::{SigningSecrets, TokenLifetimes};
use magicstream_core::store::DEFAULT_STORE_TIMEOUT;

/// Environment variable overriding the store timeout, in seconds.
pub const STORE_TIMEOUT_VAR: &str = "STORE_TIMEOUT_SECS";

/// Listener address until the binary applies `--host`/`--port`.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener. Set by the binary from `--host`
    /// and `--port`.
    pub bind_addr: String,
    /// Access and refresh signing keys.
    pub secrets: SigningSecrets,
    /// Access and refresh token lifetimes.
    pub lifetimes: TokenLifetimes,
    /// Upper bound on each user/movie store call.
    pub store_timeout: Duration,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                 | Default          |
    /// |--------------------------|------------------|
    /// | `SECRET_KEY`             | required         |
    /// | `SECRET_REFRESH_KEY`     | required         |
    /// | `ACCESS_TOKEN_TTL_SECS`  | `86400`          |
    /// | `REFRESH_TOKEN_TTL_SECS` | `604800`         |
    /// | `STORE_TIMEOUT_SECS`     | `100`            |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ApiConfig::from_env`], reading through an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            secrets: SigningSecrets::from_lookup(&lookup)?,
            lifetimes: TokenLifetimes::from_lookup(&lookup)?,
            store_timeout: store_timeout_from(lookup(STORE_TIMEOUT_VAR))?,
        })
    }

    /// Configuration with explicit secrets and defaults for everything else.
    pub fn with_secrets(secrets: SigningSecrets) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            secrets,
            lifetimes: TokenLifetimes::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

fn store_timeout_from(raw: Option<String>) -> Result<Duration, ConfigError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_STORE_TIMEOUT),
        Some(value) => match value.parse::<u64>() {
            Ok(0) => Err(ConfigError::InvalidValue {
                var: STORE_TIMEOUT_VAR,
                reason: "must be greater than zero".into(),
            }),
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => Err(ConfigError::InvalidValue {
                var: STORE_TIMEOUT_VAR,
                reason: format!("'{value}': {e}"),
            }),
        },
    }
}
