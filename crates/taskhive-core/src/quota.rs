//! Note storage quota accounting
//!
//! Usage is the sum of note text bytes plus attachment bytes for one user. The
//! check is a soft limit: concurrent writes may overshoot slightly.

use crate::error::AppError;

/// 2 GiB
pub const DEFAULT_NOTE_QUOTA_BYTES: i64 = 2 * 1024 * 1024 * 1024;

/// Byte size a note's text contributes to usage
pub fn text_bytes(content: &str) -> i64 {
    content.len() as i64
}

/// Fail with [`AppError::StorageLimit`] when adding `requested` bytes to `used`
/// would exceed `limit`.
pub fn ensure_within_quota(used: i64, requested: i64, limit: i64) -> Result<(), AppError> {
    let total = used.saturating_add(requested);
    if total > limit {
        tracing::warn!(used, requested, limit, "Note quota exceeded");
        return Err(AppError::StorageLimit {
            used,
            limit,
            requested,
        });
    }
    Ok(())
}
