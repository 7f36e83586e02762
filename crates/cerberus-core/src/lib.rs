//! # cerberus-core
//!
//! Core crate for the Cerberus session authority. Contains the configuration
//! schema, typed identifiers, request deadlines, the collaborator traits, and
//! the unified error system.
//!
//! This crate has **no** internal dependencies on other Cerberus crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
