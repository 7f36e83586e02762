//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. The merged result is loaded once at start-up and then treated
//! as read-only.

pub mod auth;
pub mod cache;
pub mod logging;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::cache::{CacheConfig, CacheProviderKind};
pub use self::logging::{LogFormat, LogLevel, LoggingConfig};
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Prefix of environment variables that override file settings,
/// e.g. `CERBERUS_AUTH__JWT_SECRET`.
pub const ENV_PREFIX: &str = "CERBERUS";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential signing settings.
    pub auth: AuthConfig,
    /// Session orchestration settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Key-value backend settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `path`, an optional environment-specific overlay
    /// (`config/{env}.toml`), and environment variables prefixed with
    /// `CERBERUS_`. The result is validated before it is returned.
    pub fn load(path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        Self::finish(config)
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        Self::finish(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), AppError> {
        self.auth.validate()?;
        if self.session.store_timeout_ms == 0 || self.session.compensation_timeout_ms == 0 {
            return Err(AppError::configuration(
                "session timeouts must be greater than zero",
            ));
        }
        Ok(())
    }

    fn finish(config: config::Config) -> Result<Self, AppError> {
        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.jwt_access_ttl_minutes, 15);
        assert_eq!(config.auth.jwt_refresh_ttl_hours, 24);
        assert_eq!(config.cache.provider, CacheProviderKind::Memory);
        assert_eq!(config.cache.redis.key_prefix, "cerberus:");
        assert!(config.session.serialize_per_user);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            jwt_access_ttl_minutes = 5
            jwt_refresh_ttl_hours = 2

            [session]
            store_timeout_ms = 750
            serialize_per_user = false

            [cache]
            provider = "redis"

            [cache.redis]
            url = "redis://cache:6379"

            [logging]
            level = "debug"
            format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.jwt_access_ttl_minutes, 5);
        assert_eq!(config.session.store_timeout_ms, 750);
        assert!(!config.session.serialize_per_user);
        assert_eq!(config.cache.provider, CacheProviderKind::Redis);
        assert_eq!(config.cache.redis.url, "redis://cache:6379");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let err = AppConfig::from_toml_str("[auth]\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_session_timeout_is_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"

            [session]
            compensation_timeout_ms = 0
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
