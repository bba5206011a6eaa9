use campusqa_core::types::{DbId, Timestamp};
use campusqa_core::voting::{VoteDirection, VoteState};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `votes` table. `direction` is `1` or `-1`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VoteRow {
    pub entity_kind: String,
    pub entity_id: DbId,
    pub user_id: DbId,
    pub direction: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl VoteRow {
    pub fn state(&self) -> VoteState {
        VoteDirection::from_i16(self.direction).map_or(VoteState::None, VoteState::held)
    }
}
