//! Per-user credential slots on top of a TTL key-value backend.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cerberus_core::error::AppError;
use cerberus_core::result::AppResult;
use cerberus_core::traits::CacheProvider;
use cerberus_core::types::{Deadline, UserId};

/// The two credential slots every user has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// Current access token.
    Access,
    /// Current refresh secret.
    Refresh,
}

impl CredentialKind {
    /// Key namespace for this slot.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }

    /// Backend key holding this slot for `user_id`.
    pub fn key(&self, user_id: &UserId) -> String {
        format!("{}:{}", self.prefix(), user_id)
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Stores, reads, and removes the live credential of each slot.
///
/// Expiry is left entirely to the backend. Every call is bounded by the
/// caller's [`Deadline`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    cache: Arc<dyn CacheProvider>,
}

impl SessionStore {
    /// Creates a store over the given backend.
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self { cache }
    }

    /// Writes `value` into the slot, replacing whatever was there.
    pub async fn put(
        &self,
        kind: CredentialKind,
        user_id: &UserId,
        value: &str,
        ttl: Duration,
        deadline: Deadline,
    ) -> AppResult<()> {
        let key = kind.key(user_id);
        deadline
            .run(&format!("store {kind} credential"), self.cache.set(&key, value, ttl))
            .await
    }

    /// Reads the slot. A missing or expired entry is `SessionNotFound`.
    pub async fn get(
        &self,
        kind: CredentialKind,
        user_id: &UserId,
        deadline: Deadline,
    ) -> AppResult<String> {
        let key = kind.key(user_id);
        deadline
            .run(&format!("read {kind} credential"), self.cache.get(&key))
            .await?
            .ok_or_else(|| AppError::session_not_found(format!("No {kind} credential stored")))
    }

    /// Empties the slot. Emptying an empty slot succeeds.
    pub async fn delete(
        &self,
        kind: CredentialKind,
        user_id: &UserId,
        deadline: Deadline,
    ) -> AppResult<()> {
        let key = kind.key(user_id);
        deadline
            .run(&format!("delete {kind} credential"), self.cache.delete(&key))
            .await
    }

    /// Checks that the backend answers.
    pub async fn health_check(&self, deadline: Deadline) -> AppResult<bool> {
        deadline.run("backend health check", self.cache.health_check()).await
    }
}
