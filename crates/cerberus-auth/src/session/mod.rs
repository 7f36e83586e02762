//! Session lifecycle: credential slots, per-user locks, and the service
//! that drives Login / Validate / Refresh / Logout.

pub mod lock;
pub mod service;
pub mod store;

pub use lock::{UserLockGuard, UserLocks};
pub use service::{RevocationOutcome, SessionOptions, SessionService, TokenPair};
pub use store::{CredentialKind, SessionStore};
