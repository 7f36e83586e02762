//! User record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cerberus_core::types::UserId;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier, used as the session key.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address, unique (case-insensitive).
    pub email: String,
    /// Argon2id password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a new user with a generated id.
    pub fn register(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Lookup key for `email`.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}
