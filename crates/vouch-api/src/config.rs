//! # Service Configuration
//!
//! Built once at startup from the process environment and passed explicitly
//! into constructors. Nothing reads the environment after [`AppConfig::from_env`]
//! returns.
//!
//! | Variable              | Default       |
//! |-----------------------|---------------|
//! | `PORT`                | `8080`        |
//! | `MODE`                | `development` |
//! | `DATABASE_URL`        | unset         |
//! | `REDIS_URL`           | unset         |
//! | `ACCESS_TOKEN_SECRET` | required      |
//! | `ACCESS_TOKEN_TTL`    | `15m`         |
//! | `REFRESH_TOKEN_TTL`   | `720h`        |
//! | `VALIDATION_API_KEY`  | required      |
//! | `PASSWORD_HASH_COST`  | `3`           |
//! | `LOG_FORMAT`          | `text`        |

use std::time::Duration;

use thiserror::Error;
use vouch_token::{TokenConfig, MIN_SECRET_LEN};
use zeroize::Zeroizing;

/// Configuration loading errors. Each one aborts startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A variable is set but unusable.
    #[error("{var} is invalid: {reason}")]
    Invalid {
        /// The variable name.
        var: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Migrations run at startup.
    Development,
    /// Migrations are applied out of band.
    Production,
}

impl AppMode {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::Invalid {
                var: "MODE",
                reason: format!("expected 'development' or 'production', got '{other}'"),
            }),
        }
    }

    /// Whether embedded migrations run at startup.
    pub fn runs_migrations(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// The management API key. Wiped on drop; custom `Debug` redacts it.
#[derive(Clone)]
pub struct ApiKey(Zeroizing<String>);

impl ApiKey {
    /// Wrap a key value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    /// The raw key, for constant-time comparison only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Deployment mode.
    pub mode: AppMode,
    /// Postgres URL. `None` selects the in-memory user directory.
    pub database_url: Option<String>,
    /// Redis URL. `None` selects the in-memory credential store.
    pub redis_url: Option<String>,
    /// Signing secret and credential lifetimes.
    pub tokens: TokenConfig,
    /// Key required in `X-API-Key` on management endpoints.
    pub api_key: ApiKey,
    /// Argon2id iteration count.
    pub password_hash_cost: u32,
    /// Log output format.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let mode = match get("MODE") {
            Some(raw) => AppMode::parse(&raw)?,
            None => AppMode::Development,
        };

        let secret = get("ACCESS_TOKEN_SECRET").ok_or(ConfigError::Missing("ACCESS_TOKEN_SECRET"))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let access_ttl = whole_seconds("ACCESS_TOKEN_TTL", ttl(&get, "ACCESS_TOKEN_TTL", "15m")?)?;
        let refresh_ttl = ttl(&get, "REFRESH_TOKEN_TTL", "720h")?;

        let api_key = get("VALIDATION_API_KEY").ok_or(ConfigError::Missing("VALIDATION_API_KEY"))?;

        let password_hash_cost = match get("PASSWORD_HASH_COST") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|cost| *cost >= 1)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "PASSWORD_HASH_COST",
                    reason: format!("expected a positive integer, got '{raw}'"),
                })?,
            None => crate::password::DEFAULT_COST,
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    reason: format!("expected 'text' or 'json', got '{other}'"),
                })
            }
        };

        Ok(Self {
            port,
            mode,
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL"),
            tokens: TokenConfig::new(Zeroizing::new(secret).as_bytes(), access_ttl, refresh_ttl),
            api_key: ApiKey::new(api_key),
            password_hash_cost,
            log_format,
        })
    }
}

fn ttl<G>(get: &G, var: &'static str, default: &str) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let raw = get(var).unwrap_or_else(|| default.to_string());
    let parsed = humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("invalid duration '{raw}': {e}"),
    })?;
    if parsed.is_zero() {
        return Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".into(),
        });
    }
    Ok(parsed)
}

/// Access credentials carry whole-second `iat`/`exp` claims, so their
/// lifetime must be a whole number of seconds.
fn whole_seconds(var: &'static str, ttl: Duration) -> Result<Duration, ConfigError> {
    if ttl.subsec_nanos() != 0 {
        return Err(ConfigError::Invalid {
            var,
            reason: "must be a whole number of seconds".into(),
        });
    }
    Ok(ttl)
}
