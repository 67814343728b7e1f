//! Convenience result type alias for Tollgate.

use crate::error::AppError;

/// A specialized `Result` type for Tollgate infrastructure operations.
pub type AppResult<T> = Result<T, AppError>;
