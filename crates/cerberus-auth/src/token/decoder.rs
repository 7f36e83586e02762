//! JWT access token validation.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use cerberus_core::error::AppError;

use super::claims::AccessClaims;

/// Validates access tokens in two modes: full (signature and expiry) and
/// signature-only.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Signature and expiry.
    validation: Validation,
    /// Signature only; `exp` must still be present.
    signature_only: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder for the given HMAC secret.
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_seconds;

        let mut signature_only = validation.clone();
        signature_only.validate_exp = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            signature_only,
        }
    }

    /// Decodes an access token, checking signature and expiry.
    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.decode_with(token, &self.validation)
    }

    /// Decodes an access token, checking the signature but not expiry.
    pub fn decode_ignoring_expiry(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.decode_with(token, &self.signature_only)
    }

    fn decode_with(&self, token: &str, validation: &Validation) -> Result<AccessClaims, AppError> {
        let token_data =
            decode::<AccessClaims>(token, &self.decoding_key, validation).map_err(|e| {
                match e.kind() {
                    JwtErrorKind::ExpiredSignature => {
                        AppError::credential_expired("Token has expired")
                    }
                    JwtErrorKind::InvalidSignature => {
                        AppError::credential_invalid("Invalid token signature")
                    }
                    JwtErrorKind::InvalidToken => {
                        AppError::credential_invalid("Invalid token format")
                    }
                    _ => AppError::credential_invalid(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}
