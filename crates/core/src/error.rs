use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Concurrent writers kept colliding until the retry budget ran out.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The persistence layer could not be reached or rejected the unit.
    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Operation timed out after {millis}ms")]
    Timeout { millis: u64 },
}

/// Fail with [`CoreError::Forbidden`] unless `requester_id` owns the entity.
pub fn ensure_author(
    entity: &'static str,
    author_id: DbId,
    requester_id: DbId,
) -> Result<(), CoreError> {
    if author_id == requester_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Only the author can modify this {}",
            entity.to_lowercase()
        )))
    }
}
