// Utility modules

use crate::error::{AppError, Result};

/// Resolves a `limit` query parameter: missing means `default`, zero is
/// rejected, anything above `max` is capped.
pub fn resolve_limit(requested: Option<usize>, default: usize, max: usize) -> Result<usize> {
    match requested {
        None => Ok(default.min(max)),
        Some(0) => Err(AppError::BadRequest("limit must be at least 1".to_string())),
        Some(limit) => Ok(limit.min(max)),
    }
}
