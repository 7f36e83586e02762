//! Collaborator traits defined in `cerberus-core` and implemented by other crates.

pub mod cache;
pub mod identity;

pub use cache::CacheProvider;
pub use identity::PasswordVerifier;
