use campusqa_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `answers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnswerRow {
    pub id: DbId,
    pub question_id: DbId,
    pub author_id: DbId,
    pub body: String,
    pub vote_count: i64,
    pub is_accepted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
