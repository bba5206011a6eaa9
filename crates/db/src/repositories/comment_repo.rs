//! Repository for the `comments` table.

use campusqa_core::types::DbId;
use campusqa_core::votable::{EntityKind, VotableRef};
use sqlx::PgConnection;

use crate::models::comment::CommentRow;

/// Column list for comments queries.
const COLUMNS: &str = "id, entity_kind, entity_id, position, author_id, text, created_at";

/// Provides the append-only comment log.
pub struct CommentRepo;

impl CommentRepo {
    /// Append a comment at the next position.
    ///
    /// The timestamp is the later of the clock and the previous comment's,
    /// so the log never goes backwards in time. Callers must hold the parent
    /// lock from [`lock_votable`](crate::repositories::lock_votable).
    pub async fn append(
        conn: &mut PgConnection,
        target: VotableRef,
        author_id: DbId,
        text: &str,
    ) -> Result<CommentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (entity_kind, entity_id, position, author_id, text, created_at) \
             SELECT $1, $2, COALESCE(MAX(position) + 1, 0), $3, $4, \
                    GREATEST(clock_timestamp(), MAX(created_at)) \
             FROM comments WHERE entity_kind = $1 AND entity_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(target.kind.as_str())
            .bind(target.id)
            .bind(author_id)
            .bind(text)
            .fetch_one(conn)
            .await
    }

    /// Comments on the given entities of one kind, in log order.
    pub async fn list_for(
        conn: &mut PgConnection,
        kind: EntityKind,
        entity_ids: &[DbId],
    ) -> Result<Vec<CommentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments \
             WHERE entity_kind = $1 AND entity_id = ANY($2) \
             ORDER BY entity_id, position"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(kind.as_str())
            .bind(entity_ids)
            .fetch_all(conn)
            .await
    }

    /// Remove an entity's whole comment log.
    pub async fn delete_for_entity(
        conn: &mut PgConnection,
        target: VotableRef,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE entity_kind = $1 AND entity_id = $2")
            .bind(target.kind.as_str())
            .bind(target.id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
