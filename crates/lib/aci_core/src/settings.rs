//! Authentication configuration.
//!
//! Constructed once at process start and passed by reference into the
//! token codec, authenticator and access guard.

use thiserror::Error;

use crate::auth::password::{MAX_COST, MAX_PASSWORD_BYTES, MIN_COST};
use crate::auth::policy::PasswordPolicy;

/// Default access-token lifetime in minutes.
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 30;

/// Default refresh-token lifetime in days.
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// Default bcrypt work factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Secrets, lifetimes and password rules for the auth core.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 key for access tokens.
    pub access_secret: String,
    /// HS256 key for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub password_policy: PasswordPolicy,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("password_policy", &self.password_policy)
            .finish()
    }
}

impl AuthConfig {
    /// Build a config with default lifetimes, cost and policy.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl_minutes: DEFAULT_ACCESS_TTL_MINUTES,
            refresh_ttl_days: DEFAULT_REFRESH_TTL_DAYS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            password_policy: PasswordPolicy::default(),
        }
    }

    /// Reads configuration from environment variables, then validates it.
    ///
    /// | Variable                       | Default  |
    /// |--------------------------------|----------|
    /// | `JWT_SECRET_KEY`               | required |
    /// | `JWT_REFRESH_SECRET_KEY`       | required |
    /// | `ACCESS_TOKEN_EXPIRE_MINUTES`  | `30`     |
    /// | `REFRESH_TOKEN_EXPIRE_DAYS`    | `7`      |
    /// | `BCRYPT_ROUNDS`                | `12`     |
    /// | `PASSWORD_MIN_LENGTH`          | `8`      |
    /// | `PASSWORD_REQUIRE_UPPERCASE`   | `true`   |
    /// | `PASSWORD_REQUIRE_LOWERCASE`   | `true`   |
    /// | `PASSWORD_REQUIRE_DIGIT`       | `true`   |
    /// | `PASSWORD_REQUIRE_SPECIAL`     | `true`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_secret = get("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;
        let refresh_secret = get("JWT_REFRESH_SECRET_KEY")
            .ok_or(ConfigError::Missing("JWT_REFRESH_SECRET_KEY"))?;

        let defaults = PasswordPolicy::default();
        let config = Self {
            access_secret,
            refresh_secret,
            access_ttl_minutes: parse_or(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                get("ACCESS_TOKEN_EXPIRE_MINUTES"),
                DEFAULT_ACCESS_TTL_MINUTES,
            )?,
            refresh_ttl_days: parse_or(
                "REFRESH_TOKEN_EXPIRE_DAYS",
                get("REFRESH_TOKEN_EXPIRE_DAYS"),
                DEFAULT_REFRESH_TTL_DAYS,
            )?,
            bcrypt_cost: parse_or("BCRYPT_ROUNDS", get("BCRYPT_ROUNDS"), DEFAULT_BCRYPT_COST)?,
            password_policy: PasswordPolicy {
                min_length: parse_or(
                    "PASSWORD_MIN_LENGTH",
                    get("PASSWORD_MIN_LENGTH"),
                    defaults.min_length,
                )?,
                require_uppercase: parse_or(
                    "PASSWORD_REQUIRE_UPPERCASE",
                    get("PASSWORD_REQUIRE_UPPERCASE"),
                    defaults.require_uppercase,
                )?,
                require_lowercase: parse_or(
                    "PASSWORD_REQUIRE_LOWERCASE",
                    get("PASSWORD_REQUIRE_LOWERCASE"),
                    defaults.require_lowercase,
                )?,
                require_digit: parse_or(
                    "PASSWORD_REQUIRE_DIGIT",
                    get("PASSWORD_REQUIRE_DIGIT"),
                    defaults.require_digit,
                )?,
                require_special: parse_or(
                    "PASSWORD_REQUIRE_SPECIAL",
                    get("PASSWORD_REQUIRE_SPECIAL"),
                    defaults.require_special,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET_KEY"));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_REFRESH_SECRET_KEY"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Invalid {
                key: "JWT_REFRESH_SECRET_KEY",
                reason: "must differ from JWT_SECRET_KEY".into(),
            });
        }
        if self.access_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: "must be positive".into(),
            });
        }
        if self.refresh_ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_EXPIRE_DAYS",
                reason: "must be positive".into(),
            });
        }
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_ROUNDS",
                reason: format!("must be between {MIN_COST} and {MAX_COST}"),
            });
        }
        if !(1..=MAX_PASSWORD_BYTES).contains(&self.password_policy.min_length) {
            return Err(ConfigError::Invalid {
                key: "PASSWORD_MIN_LENGTH",
                reason: format!("must be between 1 and {MAX_PASSWORD_BYTES}"),
            });
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("cannot parse '{v}'"),
        }),
    }
}
