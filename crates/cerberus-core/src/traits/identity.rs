//! The user-record collaborator consumed by the session layer.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::UserId;

/// Resolves an identity and password to the user it belongs to.
///
/// Implementations return [`ErrorKind::IdentityRejected`](crate::error::ErrorKind)
/// for unknown identities and wrong passwords alike.
#[async_trait]
pub trait PasswordVerifier: Send + Sync {
    /// Verify `secret` for `identity` and return the owning user id.
    async fn verify_password(&self, identity: &str, secret: &str) -> AppResult<UserId>;
}
