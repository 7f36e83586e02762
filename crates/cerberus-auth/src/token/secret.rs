//! Opaque refresh secrets and constant-time comparison.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use cerberus_core::error::{AppError, ErrorKind};

/// Random bytes in every refresh secret (256 bits).
pub const REFRESH_SECRET_BYTES: usize = 32;

/// Draws a refresh secret from the OS random source, base64 encoded.
pub fn generate_refresh_secret() -> Result<String, AppError> {
    let mut bytes = [0u8; REFRESH_SECRET_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        AppError::with_source(
            ErrorKind::Entropy,
            format!("Failed to generate refresh token: {e}"),
            e,
        )
    })?;
    Ok(STANDARD.encode(bytes))
}

/// Compares two secrets without leaking where they differ, or their lengths.
///
/// Both sides are hashed first so the loop always runs over 32 bytes.
pub fn secrets_match(stored: &str, presented: &str) -> bool {
    let a = Sha256::digest(stored.as_bytes());
    let b = Sha256::digest(presented.as_bytes());
    constant_time_eq(&a[..], &b[..])
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
