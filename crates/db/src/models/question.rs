use campusqa_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `questions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionRow {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub vote_count: i64,
    pub accepted_answer_id: Option<DbId>,
    pub views: i64,
    pub is_active: bool,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
