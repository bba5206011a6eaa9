//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods.
//! Standalone writes accept `&PgPool`. Anything that takes part in a
//! multi-statement unit, including the reads behind a consistent view,
//! accepts `&mut PgConnection` so callers can pass `&mut *tx`.

use campusqa_core::types::DbId;
use campusqa_core::votable::{EntityKind, VotableRef};
use sqlx::PgConnection;

pub mod answer_repo;
pub mod comment_repo;
pub mod question_repo;
pub mod reputation_repo;
pub mod vote_repo;

pub use answer_repo::AnswerRepo;
pub use comment_repo::CommentRepo;
pub use question_repo::QuestionRepo;
pub use reputation_repo::ReputationRepo;
pub use vote_repo::VoteRepo;

/// Table holding the votable entity and the filter that hides soft-deleted
/// rows (questions only).
pub(crate) fn votable_table(kind: EntityKind) -> (&'static str, &'static str) {
    match kind {
        EntityKind::Question => ("questions", "AND is_active"),
        EntityKind::Answer => ("answers", ""),
    }
}

/// Lock a votable row for the rest of the transaction.
///
/// Returns `false` if it is missing or soft-deleted.
pub async fn lock_votable(conn: &mut PgConnection, target: VotableRef) -> Result<bool, sqlx::Error> {
    let (table, active) = votable_table(target.kind);
    let query = format!("SELECT id FROM {table} WHERE id = $1 {active} FOR UPDATE");
    let row: Option<(DbId,)> = sqlx::query_as(&query)
        .bind(target.id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}
