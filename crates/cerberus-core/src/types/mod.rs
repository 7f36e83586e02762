//! Shared domain types.

pub mod deadline;
pub mod id;

pub use deadline::Deadline;
pub use id::UserId;
