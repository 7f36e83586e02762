//! # cerberus-auth
//!
//! Credential issuing and the session lifecycle for the Cerberus session
//! authority.
//!
//! ## Modules
//!
//! - `token`: signed access credentials and opaque refresh secrets
//! - `session`: per-user credential slots, locking, and the Login /
//!   Validate / Refresh / Logout state machine
//! - `password`: Argon2id password hashing and the new-password policy
//! - `identity`: in-memory user directory implementing `PasswordVerifier`

pub mod identity;
pub mod password;
pub mod session;
pub mod token;

pub use identity::{User, UserDirectory};
pub use password::{PasswordHasher, PasswordPolicy};
pub use session::{CredentialKind, RevocationOutcome, SessionService, SessionStore, TokenPair};
pub use token::{AccessClaims, TokenIssuer};
