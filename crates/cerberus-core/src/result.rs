//! Convenience result type alias for Cerberus.

use crate::error::AppError;

/// A specialized `Result` type for Cerberus operations.
pub type AppResult<T> = Result<T, AppError>;
