//! JWT access token creation with configurable TTL.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use cerberus_core::error::{AppError, ErrorKind};
use cerberus_core::types::UserId;

use super::claims::AccessClaims;

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Compact JWS serialization.
    pub token: String,
    /// Claims that were signed.
    pub claims: AccessClaims,
    /// Expiration as a timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Creates signed JWT access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token lifetime.
    access_ttl: chrono::Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder for the given HMAC secret.
    pub fn new(secret: &[u8], access_ttl: std::time::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            access_ttl: chrono::Duration::seconds(access_ttl.as_secs() as i64),
        }
    }

    /// Signs an access token for `user_id`, valid from now.
    pub fn generate_access_token(&self, user_id: &UserId) -> Result<AccessToken, AppError> {
        self.generate_access_token_at(user_id, Utc::now())
    }

    /// Signs an access token as if it were issued at `issued_at`.
    pub(crate) fn generate_access_token_at(
        &self,
        user_id: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, AppError> {
        let expires_at = issued_at + self.access_ttl;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::with_source(
                ErrorKind::Signing,
                format!("Failed to encode access token: {e}"),
                e,
            )
        })?;

        Ok(AccessToken {
            token,
            claims,
            expires_at,
        })
    }
}
