//! Append-only comment log attached to a votable entity.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Maximum comment length in characters, after trimming.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// One remark in an entity's comment log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Zero-based index in the entity's log; display order.
    pub position: i32,
    pub author_id: DbId,
    pub text: String,
    pub created_at: Timestamp,
}

/// Trim comment text and check it is non-empty and within length.
pub fn normalize_comment_text(text: &str) -> Result<String, CoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Comment text must not be empty".into()));
    }
    let len = trimmed.chars().count();
    if len > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment text must be at most {MAX_COMMENT_LENGTH} characters, got {len}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Timestamp for the next comment: never earlier than the last one.
pub fn next_comment_timestamp(last: Option<Timestamp>, now: Timestamp) -> Timestamp {
    match last {
        Some(last) if last > now => last,
        _ => now,
    }
}
