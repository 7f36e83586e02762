//! User records and the in-memory user directory.

pub mod directory;
pub mod user;

pub use directory::UserDirectory;
pub use user::User;
