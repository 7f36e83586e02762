//! In-memory user directory backed by a concurrent map.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use cerberus_core::error::AppError;
use cerberus_core::result::AppResult;
use cerberus_core::traits::PasswordVerifier;
use cerberus_core::types::UserId;

use crate::password::{PasswordHasher, PasswordPolicy};

use super::user::User;

/// Returned for both unknown identities and wrong passwords.
const REJECTED: &str = "Invalid email or password";

/// User records keyed by normalized email.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: DashMap<String, User>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl UserDirectory {
    /// Creates an empty directory.
    pub fn new(hasher: PasswordHasher, policy: PasswordPolicy) -> Self {
        Self {
            users: DashMap::new(),
            hasher,
            policy,
        }
    }

    /// Registers a new user, hashing the password.
    pub fn register(&self, name: &str, email: &str, password: &str) -> AppResult<User> {
        let key = User::normalize_email(email);
        if key.is_empty() {
            return Err(AppError::validation("Email must not be empty"));
        }
        self.policy.validate(password)?;

        if self.users.contains_key(&key) {
            return Err(AppError::conflict(format!("User '{key}' already exists")));
        }
        let hash = self.hasher.hash_password(password)?;

        match self.users.entry(key) {
            Entry::Occupied(entry) => Err(AppError::conflict(format!(
                "User '{}' already exists",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                let user = User::register(name.trim(), email.trim(), hash);
                info!(user_id = %user.id, "User registered");
                Ok(entry.insert(user).clone())
            }
        }
    }

    /// Looks up a user by email.
    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .get(&User::normalize_email(email))
            .map(|user| user.clone())
    }

    /// Replaces the password after verifying the current one.
    pub fn change_password(&self, email: &str, current: &str, new: &str) -> AppResult<()> {
        self.authenticate(email, current)?;
        self.policy.validate_not_same(current, new)?;
        self.policy.validate(new)?;

        let hash = self.hasher.hash_password(new)?;
        let mut user = self
            .users
            .get_mut(&User::normalize_email(email))
            .ok_or_else(|| AppError::identity_rejected(REJECTED))?;
        user.password_hash = hash;
        user.updated_at = Utc::now();
        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no user is registered.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn authenticate(&self, identity: &str, secret: &str) -> AppResult<User> {
        let Some(user) = self.find_by_email(identity) else {
            debug!("Login attempt for unknown identity");
            return Err(AppError::identity_rejected(REJECTED));
        };

        if !self.hasher.verify_password(secret, &user.password_hash)? {
            debug!(user_id = %user.id, "Wrong password");
            return Err(AppError::identity_rejected(REJECTED));
        }
        Ok(user)
    }
}

#[async_trait]
impl PasswordVerifier for UserDirectory {
    async fn verify_password(&self, identity: &str, secret: &str) -> AppResult<UserId> {
        self.authenticate(identity, secret).map(|user| user.id)
    }
}
