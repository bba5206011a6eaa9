use campusqa_core::comments::Comment;
use campusqa_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentRow {
    pub id: DbId,
    pub entity_kind: String,
    pub entity_id: DbId,
    pub position: i32,
    pub author_id: DbId,
    pub text: String,
    pub created_at: Timestamp,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            position: row.position,
            author_id: row.author_id,
            text: row.text,
            created_at: row.created_at,
        }
    }
}
