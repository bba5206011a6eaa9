use campusqa_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `reputation_accounts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReputationAccountRow {
    pub user_id: DbId,
    pub score: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
