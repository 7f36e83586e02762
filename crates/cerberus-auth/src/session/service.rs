//! Session lifecycle service: login, validate, refresh, logout.
//!
//! Each user has two slots (access, refresh). A session is `Active` while
//! both hold the pair issued together; anything else is `NoSession`:
//!
//! ```text
//! NoSession --login--> Active --refresh--> Active
//! Active --logout | ttl expiry | login--> NoSession (then Active again on login)
//! ```
//!
//! The two writes that create a pair are independent backend calls. With
//! per-user serialization enabled, login, refresh, and logout for the same
//! user never interleave, which closes the hybrid-pair and refresh-replay
//! races. Validate never locks and never writes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use cerberus_core::config::{AuthConfig, SessionConfig};
use cerberus_core::error::{AppError, ErrorKind};
use cerberus_core::result::AppResult;
use cerberus_core::traits::{CacheProvider, PasswordVerifier};
use cerberus_core::types::{Deadline, UserId};

use crate::token::TokenIssuer;
use crate::token::secret::secrets_match;

use super::lock::{UserLockGuard, UserLocks};
use super::store::{CredentialKind, SessionStore};

/// Message for every refresh rejection, whichever check failed.
const REFRESH_REJECTED: &str = "Invalid or expired refresh token";

/// Credentials handed to the caller after login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh secret.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh secret expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

/// What happened to each slot during a logout or revoke.
#[derive(Debug, Default)]
pub struct RevocationOutcome {
    /// Slots whose delete failed, with the backend error.
    pub failures: Vec<(CredentialKind, AppError)>,
}

impl RevocationOutcome {
    /// Both slots were deleted (or already empty).
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the delete of `kind` failed.
    pub fn failed(&self, kind: CredentialKind) -> bool {
        self.failures.iter().any(|(k, _)| *k == kind)
    }

    /// Converts to a result carrying the first failure.
    pub fn into_result(self) -> AppResult<()> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }
}

/// Tunables of [`SessionService`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Lifetime of refresh secrets and of their store entries.
    pub refresh_ttl: Duration,
    /// Deadline for the compensating delete after a failed refresh write.
    pub compensation_timeout: Duration,
    /// Serialize login, refresh, and logout per user id.
    pub serialize_per_user: bool,
}

impl SessionOptions {
    /// Builds options from configuration.
    pub fn from_config(auth: &AuthConfig, session: &SessionConfig) -> Self {
        Self {
            refresh_ttl: auth.refresh_ttl(),
            compensation_timeout: session.compensation_timeout(),
            serialize_per_user: session.serialize_per_user,
        }
    }
}

/// Orchestrates the token issuer and the session store.
#[derive(Clone)]
pub struct SessionService {
    /// Credential signing and verification.
    issuer: Arc<TokenIssuer>,
    /// Credential slots.
    store: Arc<SessionStore>,
    /// Present when per-user serialization is enabled.
    locks: Option<UserLocks>,
    /// Service tunables.
    options: SessionOptions,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("options", &self.options)
            .finish()
    }
}

impl SessionService {
    /// Creates a new session service with all required dependencies.
    pub fn new(issuer: Arc<TokenIssuer>, store: Arc<SessionStore>, options: SessionOptions) -> Self {
        let locks = options.serialize_per_user.then(UserLocks::new);
        Self {
            issuer,
            store,
            locks,
            options,
        }
    }

    /// Wires a service from configuration and a backend.
    pub fn from_config(
        auth: &AuthConfig,
        session: &SessionConfig,
        cache: Arc<dyn CacheProvider>,
    ) -> AppResult<Self> {
        let issuer = Arc::new(TokenIssuer::from_config(auth)?);
        let store = Arc::new(SessionStore::new(cache));
        Ok(Self::new(
            issuer,
            store,
            SessionOptions::from_config(auth, session),
        ))
    }

    /// The issuer shared by this service.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Starts a new session for an already authenticated user.
    ///
    /// 1. Revoke any previous pair (failures logged, not fatal)
    /// 2. Issue access token and refresh secret
    /// 3. Store the access token; failure aborts
    /// 4. Store the refresh secret; failure deletes the access token again
    pub async fn login(&self, user_id: &UserId, deadline: Deadline) -> AppResult<TokenPair> {
        let _guard = self.lock_user(user_id, deadline).await?;

        let previous = self.delete_slots(user_id, deadline).await;
        for (kind, err) in &previous.failures {
            warn!(
                user_id = %user_id,
                kind = %kind,
                error = %err,
                "Failed to revoke previous credential before login"
            );
        }

        let pair = self.issue_and_store(user_id, deadline).await?;
        info!(user_id = %user_id, "Session created");
        Ok(pair)
    }

    /// Verifies a password through the user store, then logs in.
    pub async fn login_with_password(
        &self,
        verifier: &dyn PasswordVerifier,
        identity: &str,
        secret: &str,
        deadline: Deadline,
    ) -> AppResult<(UserId, TokenPair)> {
        let user_id = verifier.verify_password(identity, secret).await?;
        let pair = self.login(&user_id, deadline).await?;
        Ok((user_id, pair))
    }

    /// Returns whether `presented` is the live access token of `user_id`.
    ///
    /// Credential problems of any kind yield `Ok(false)`; only backend
    /// failures are errors.
    pub async fn validate(
        &self,
        user_id: &UserId,
        presented: &str,
        deadline: Deadline,
    ) -> AppResult<bool> {
        let subject = match self.issuer.verify_access(presented) {
            Ok(subject) => subject,
            Err(e) if e.is_unauthenticated() => {
                debug!(user_id = %user_id, reason = %e.kind, "Access token rejected");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if subject != *user_id {
            debug!(user_id = %user_id, "Access token issued to another user");
            return Ok(false);
        }

        let stored = match self.store.get(CredentialKind::Access, user_id, deadline).await {
            Ok(stored) => stored,
            Err(e) if e.kind == ErrorKind::SessionNotFound => {
                debug!(user_id = %user_id, "No live access token stored");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let active = secrets_match(&stored, presented);
        if !active {
            debug!(user_id = %user_id, "Access token superseded");
        }
        Ok(active)
    }

    /// Validates an access token and returns its subject when active.
    pub async fn authenticate(&self, presented: &str, deadline: Deadline) -> AppResult<Option<UserId>> {
        let subject = match self.issuer.verify_access(presented) {
            Ok(subject) => subject,
            Err(e) if e.is_unauthenticated() => {
                debug!(reason = %e.kind, "Access token rejected");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let active = self.validate(&subject, presented, deadline).await?;
        Ok(active.then_some(subject))
    }

    /// Exchanges the current refresh secret for a new pair.
    ///
    /// The consumed secret is deleted before the new pair is written, so it
    /// cannot be exchanged a second time.
    pub async fn refresh(
        &self,
        user_id: &UserId,
        presented: &str,
        deadline: Deadline,
    ) -> AppResult<TokenPair> {
        let _guard = self.lock_user(user_id, deadline).await?;

        let stored = match self.store.get(CredentialKind::Refresh, user_id, deadline).await {
            Ok(stored) => stored,
            Err(e) if e.kind == ErrorKind::SessionNotFound => {
                debug!(user_id = %user_id, "Refresh without a live session");
                return Err(AppError::session_not_found(REFRESH_REJECTED));
            }
            Err(e) => return Err(e),
        };

        if !self.issuer.compare_refresh(&stored, presented) {
            debug!(user_id = %user_id, "Refresh token mismatch");
            return Err(AppError::credential_mismatch(REFRESH_REJECTED));
        }

        let consumed = self.delete_slots(user_id, deadline).await;
        for (kind, err) in consumed.failures {
            if kind == CredentialKind::Refresh {
                error!(
                    user_id = %user_id,
                    error = %err,
                    "Could not delete consumed refresh token, aborting rotation"
                );
                return Err(err);
            }
            warn!(
                user_id = %user_id,
                kind = %kind,
                error = %err,
                "Failed to revoke previous access token during refresh"
            );
        }

        let pair = self.issue_and_store(user_id, deadline).await?;
        info!(user_id = %user_id, "Session rotated");
        Ok(pair)
    }

    /// Refresh driven by the (possibly expired) access token.
    ///
    /// The subject is taken from the access token after checking its
    /// signature only; expiry is ignored so a client can refresh right
    /// after its access token lapsed.
    pub async fn refresh_with_access(
        &self,
        presented_access: &str,
        presented_refresh: &str,
        deadline: Deadline,
    ) -> AppResult<TokenPair> {
        let user_id = self
            .issuer
            .extract_user_id_ignoring_expiry(presented_access)
            .map_err(|e| {
                debug!(reason = %e.kind, "Access token unusable for refresh");
                AppError::credential_invalid(REFRESH_REJECTED)
            })?;

        self.refresh(&user_id, presented_refresh, deadline).await
    }

    /// Ends the session of `user_id`.
    ///
    /// Always completes; backend failures are listed in the outcome and
    /// logged. The contract is "the session is gone or never existed".
    /// When the user lock cannot be taken before `deadline`, the deletes run
    /// without it on a fresh compensation deadline.
    pub async fn logout(&self, user_id: &UserId, deadline: Deadline) -> RevocationOutcome {
        let (_guard, deadline) = match self.lock_user(user_id, deadline).await {
            Ok(guard) => (guard, deadline),
            Err(e) => {
                // Deletes are idempotent, proceed unserialized. The caller's
                // deadline is spent, so the deletes get a fresh one.
                warn!(user_id = %user_id, error = %e, "Logout proceeding without user lock");
                (None, Deadline::after(self.options.compensation_timeout))
            }
        };

        let outcome = self.delete_slots(user_id, deadline).await;
        if outcome.is_clean() {
            info!(user_id = %user_id, "Session ended");
        } else {
            for (kind, err) in &outcome.failures {
                error!(
                    user_id = %user_id,
                    kind = %kind,
                    error = %err,
                    "Failed to delete credential during logout"
                );
            }
        }
        outcome
    }

    /// Revokes the session of `user_id`, failing if either delete failed.
    pub async fn revoke(&self, user_id: &UserId, deadline: Deadline) -> AppResult<()> {
        self.logout(user_id, deadline).await.into_result()
    }

    /// Checks that the backend answers.
    pub async fn health_check(&self, deadline: Deadline) -> AppResult<bool> {
        self.store.health_check(deadline).await
    }

    /// Takes the per-user lock when serialization is enabled.
    async fn lock_user(&self, user_id: &UserId, deadline: Deadline) -> AppResult<Option<UserLockGuard>> {
        match &self.locks {
            Some(locks) => {
                let guard = deadline
                    .run("acquire user lock", async { Ok(locks.lock(user_id).await) })
                    .await?;
                Ok(Some(guard))
            }
            None => Ok(None),
        }
    }

    /// Deletes both slots, attempting each regardless of the other.
    async fn delete_slots(&self, user_id: &UserId, deadline: Deadline) -> RevocationOutcome {
        let (access, refresh) = tokio::join!(
            self.store.delete(CredentialKind::Access, user_id, deadline),
            self.store.delete(CredentialKind::Refresh, user_id, deadline),
        );

        let mut outcome = RevocationOutcome::default();
        if let Err(e) = access {
            outcome.failures.push((CredentialKind::Access, e));
        }
        if let Err(e) = refresh {
            outcome.failures.push((CredentialKind::Refresh, e));
        }
        outcome
    }

    /// Issues a pair and writes it, access first.
    async fn issue_and_store(&self, user_id: &UserId, deadline: Deadline) -> AppResult<TokenPair> {
        let access = self.issuer.issue_access(user_id).inspect_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to sign access token");
        })?;
        let refresh = self.issuer.issue_refresh().inspect_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to generate refresh token");
        })?;
        let refresh_expires_at =
            Utc::now() + chrono::Duration::seconds(self.options.refresh_ttl.as_secs() as i64);

        self.store
            .put(
                CredentialKind::Access,
                user_id,
                &access.token,
                self.issuer.access_ttl(),
                deadline,
            )
            .await
            .inspect_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to store access token");
            })?;

        if let Err(e) = self
            .store
            .put(
                CredentialKind::Refresh,
                user_id,
                &refresh,
                self.options.refresh_ttl,
                deadline,
            )
            .await
        {
            error!(user_id = %user_id, error = %e, "Failed to store refresh token, rolling back");
            self.compensate(user_id).await;
            return Err(e);
        }

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh,
            access_expires_at: access.expires_at,
            refresh_expires_at,
        })
    }

    /// Removes a dangling access token on a fresh deadline. Single attempt.
    async fn compensate(&self, user_id: &UserId) {
        let deadline = Deadline::after(self.options.compensation_timeout);
        if let Err(e) = self
            .store
            .delete(CredentialKind::Access, user_id, deadline)
            .await
        {
            error!(
                user_id = %user_id,
                error = %e,
                "Compensating delete of access token failed"
            );
        }
    }
}
