//! Stateless credential authority: signs and verifies access tokens and
//! mints refresh secrets.

use std::time::Duration;

use cerberus_core::config::AuthConfig;
use cerberus_core::error::AppError;
use cerberus_core::types::UserId;

use super::decoder::JwtDecoder;
use super::encoder::{AccessToken, JwtEncoder};
use super::secret;

/// Issues and verifies credentials with a key injected at construction.
///
/// Holds no state beyond the key and the access lifetime, so one instance
/// is shared by every request.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    access_ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer for `secret`.
    pub fn new(secret: &[u8], access_ttl: Duration, leeway_seconds: u64) -> Self {
        Self {
            encoder: JwtEncoder::new(secret, access_ttl),
            decoder: JwtDecoder::new(secret, leeway_seconds),
            access_ttl,
        }
    }

    /// Creates an issuer from validated auth configuration.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self::new(
            config.jwt_secret.as_bytes(),
            config.access_ttl(),
            config.clock_skew_leeway_seconds,
        ))
    }

    /// Lifetime of every access token this issuer signs.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Signs an access token for `user_id`.
    pub fn issue_access(&self, user_id: &UserId) -> Result<AccessToken, AppError> {
        self.encoder.generate_access_token(user_id)
    }

    /// Mints a new refresh secret. It carries no identity.
    pub fn issue_refresh(&self) -> Result<String, AppError> {
        secret::generate_refresh_secret()
    }

    /// Checks signature and expiry and returns the subject.
    pub fn verify_access(&self, token: &str) -> Result<UserId, AppError> {
        self.decoder.decode_access_token(token)?.user_id()
    }

    /// Checks the signature only and returns the subject, even for an
    /// expired token.
    pub fn extract_user_id_ignoring_expiry(&self, token: &str) -> Result<UserId, AppError> {
        self.decoder.decode_ignoring_expiry(token)?.user_id()
    }

    /// Constant-time comparison of a stored and a presented refresh secret.
    pub fn compare_refresh(&self, stored: &str, presented: &str) -> bool {
        secret::secrets_match(stored, presented)
    }

    #[cfg(test)]
    pub(crate) fn encoder(&self) -> &JwtEncoder {
        &self.encoder
    }
}
