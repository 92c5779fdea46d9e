//! Authentication configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Digest algorithm used for stored credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordAlgorithm {
    /// Unsalted hex SHA-256, compatible with existing digests.
    #[default]
    Sha256,
    /// Salted Argon2id PHC strings.
    Argon2,
}

/// Token lifetimes and signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for access-token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: i64,
    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: i64,
    /// How long inactive refresh tokens are retained before cleanup, in days.
    #[serde(default = "default_refresh_retention")]
    pub refresh_token_retention_days: i64,
    /// Algorithm used when hashing new passwords.
    #[serde(default)]
    pub password_algorithm: PasswordAlgorithm,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            refresh_token_retention_days: default_refresh_retention(),
            password_algorithm: PasswordAlgorithm::default(),
        }
    }
}

/// Placeholder shipped in the sample configuration; never a usable key.
pub const PLACEHOLDER_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Shortest accepted HMAC key, in bytes.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Upper bound for the access-token lifetime (one day).
pub const MAX_ACCESS_TTL_MINUTES: i64 = 24 * 60;

/// Upper bound for refresh-token lifetime and retention.
pub const MAX_REFRESH_DAYS: i64 = 365;

impl AuthConfig {
    /// Reject settings that would make tokens unusable or weaken replay
    /// detection.
    ///
    /// Retention must cover the whole refresh lifetime: a rotated token that
    /// is cleaned up before it expires can no longer be recognised as a
    /// replay.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret == PLACEHOLDER_JWT_SECRET {
            return Err(AppError::configuration(
                "auth.jwt_secret is still the placeholder; set TOLLGATE__AUTH__JWT_SECRET",
            ));
        }
        if self.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {MIN_JWT_SECRET_BYTES} bytes"
            )));
        }
        if !(1..=MAX_ACCESS_TTL_MINUTES).contains(&self.access_token_ttl_minutes) {
            return Err(AppError::configuration(format!(
                "auth.access_token_ttl_minutes must be between 1 and {MAX_ACCESS_TTL_MINUTES}"
            )));
        }
        if !(1..=MAX_REFRESH_DAYS).contains(&self.refresh_token_ttl_days) {
            return Err(AppError::configuration(format!(
                "auth.refresh_token_ttl_days must be between 1 and {MAX_REFRESH_DAYS}"
            )));
        }
        if !(self.refresh_token_ttl_days..=MAX_REFRESH_DAYS)
            .contains(&self.refresh_token_retention_days)
        {
            return Err(AppError::configuration(format!(
                "auth.refresh_token_retention_days must be between \
                 auth.refresh_token_ttl_days ({}) and {MAX_REFRESH_DAYS}",
                self.refresh_token_ttl_days
            )));
        }
        Ok(())
    }
}

fn default_jwt_secret() -> String {
    PLACEHOLDER_JWT_SECRET.to_string()
}

fn default_access_ttl() -> i64 {
    30
}

fn default_refresh_ttl() -> i64 {
    7
}

fn default_refresh_retention() -> i64 {
    default_refresh_ttl()
}
