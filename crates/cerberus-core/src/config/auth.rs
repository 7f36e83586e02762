//! Authentication configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Placeholder shipped in sample configs; refused at start-up.
pub const PLACEHOLDER_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted credential lifetime (100 years), in seconds.
pub const MAX_LIFETIME_SECS: u64 = 100 * 365 * 24 * 3600;

/// Credential signing and lifetime configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_ttl_hours: u64,
    /// Tolerated clock skew when checking `exp`, in seconds.
    #[serde(default)]
    pub clock_skew_leeway_seconds: u64,
}

impl AuthConfig {
    /// Builds a configuration with the given secret and default lifetimes.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            jwt_access_ttl_minutes: default_access_ttl(),
            jwt_refresh_ttl_hours: default_refresh_ttl(),
            clock_skew_leeway_seconds: 0,
        }
    }

    /// Access credential lifetime. Saturates on overflow; `validate` rejects
    /// such values.
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt_access_ttl_minutes.saturating_mul(60))
    }

    /// Refresh credential lifetime. Saturates like [`Self::access_ttl`].
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt_refresh_ttl_hours.saturating_mul(3600))
    }

    /// Rejects missing or weak secrets and zero lifetimes.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.is_empty() || self.jwt_secret == PLACEHOLDER_SECRET {
            return Err(AppError::configuration(
                "auth.jwt_secret must be set to a private value",
            ));
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.jwt_access_ttl_minutes == 0 || self.jwt_refresh_ttl_hours == 0 {
            return Err(AppError::configuration(
                "credential lifetimes must be greater than zero",
            ));
        }
        for (name, secs) in [
            (
                "auth.jwt_access_ttl_minutes",
                self.jwt_access_ttl_minutes.checked_mul(60),
            ),
            (
                "auth.jwt_refresh_ttl_hours",
                self.jwt_refresh_ttl_hours.checked_mul(3600),
            ),
        ] {
            if !secs.is_some_and(|secs| secs <= MAX_LIFETIME_SECS) {
                return Err(AppError::configuration(format!(
                    "{name} exceeds the maximum lifetime of {MAX_LIFETIME_SECS} seconds"
                )));
            }
        }
        if self.access_ttl() > self.refresh_ttl() {
            return Err(AppError::configuration(
                "access lifetime must not exceed refresh lifetime",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_access_ttl_minutes", &self.jwt_access_ttl_minutes)
            .field("jwt_refresh_ttl_hours", &self.jwt_refresh_ttl_hours)
            .field("clock_skew_leeway_seconds", &self.clock_skew_leeway_seconds)
            .finish()
    }
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    24
}
