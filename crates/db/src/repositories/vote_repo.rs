//! Repository for the `votes` table and the tally columns of votable
//! entities.

use campusqa_core::types::DbId;
use campusqa_core::votable::{EntityKind, VotableRef};
use campusqa_core::voting::{VoteDirection, VoteState};
use sqlx::{PgConnection, PgPool};

use crate::models::vote::VoteRow;
use crate::repositories::votable_table;

/// Column list for votes queries.
const COLUMNS: &str = "entity_kind, entity_id, user_id, direction, created_at, updated_at";

/// Author of a votable entity plus one user's vote on it.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct VoteStanding {
    pub author_id: DbId,
    pub direction: Option<i16>,
}

impl VoteStanding {
    pub fn state(&self) -> VoteState {
        self.direction
            .and_then(VoteDirection::from_i16)
            .map_or(VoteState::None, VoteState::held)
    }
}

/// Provides vote membership and tally operations.
pub struct VoteRepo;

impl VoteRepo {
    /// Read an entity's author together with `user_id`'s vote.
    pub async fn standing(
        pool: &PgPool,
        target: VotableRef,
        user_id: DbId,
    ) -> Result<Option<VoteStanding>, sqlx::Error> {
        let (table, active) = votable_table(target.kind);
        let query = format!(
            "SELECT e.author_id, v.direction \
             FROM {table} e \
             LEFT JOIN votes v \
                ON v.entity_kind = $2 AND v.entity_id = e.id AND v.user_id = $3 \
             WHERE e.id = $1 {active}"
        );
        sqlx::query_as::<_, VoteStanding>(&query)
            .bind(target.id)
            .bind(target.kind.as_str())
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find one user's vote on an entity.
    pub async fn find(
        conn: &mut PgConnection,
        target: VotableRef,
        user_id: DbId,
    ) -> Result<Option<VoteRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM votes \
             WHERE entity_kind = $1 AND entity_id = $2 AND user_id = $3"
        );
        sqlx::query_as::<_, VoteRow>(&query)
            .bind(target.kind.as_str())
            .bind(target.id)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// All votes on the given entities of one kind, ordered by voter.
    pub async fn list_for(
        conn: &mut PgConnection,
        kind: EntityKind,
        entity_ids: &[DbId],
    ) -> Result<Vec<VoteRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM votes \
             WHERE entity_kind = $1 AND entity_id = ANY($2) \
             ORDER BY entity_id, user_id"
        );
        sqlx::query_as::<_, VoteRow>(&query)
            .bind(kind.as_str())
            .bind(entity_ids)
            .fetch_all(conn)
            .await
    }

    /// Add `delta` to the tally and return the new value.
    ///
    /// Callers must hold the row lock from
    /// [`lock_votable`](crate::repositories::lock_votable), which also
    /// guarantees the row exists.
    pub async fn apply_tally(
        conn: &mut PgConnection,
        target: VotableRef,
        delta: i64,
    ) -> Result<i64, sqlx::Error> {
        let (table, _) = votable_table(target.kind);
        let query = format!(
            "UPDATE {table} SET vote_count = vote_count + $2 WHERE id = $1 RETURNING vote_count"
        );
        let row: (i64,) = sqlx::query_as(&query)
            .bind(target.id)
            .bind(delta)
            .fetch_one(conn)
            .await?;
        Ok(row.0)
    }

    /// Record or switch a user's vote.
    pub async fn upsert(
        conn: &mut PgConnection,
        target: VotableRef,
        user_id: DbId,
        direction: VoteDirection,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO votes (entity_kind, entity_id, user_id, direction) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (entity_kind, entity_id, user_id) DO UPDATE \
             SET direction = EXCLUDED.direction, updated_at = NOW()",
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .bind(user_id)
        .bind(direction.as_i16())
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Withdraw a user's vote.
    pub async fn delete(
        conn: &mut PgConnection,
        target: VotableRef,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM votes WHERE entity_kind = $1 AND entity_id = $2 AND user_id = $3",
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every vote on an entity.
    pub async fn delete_for_entity(
        conn: &mut PgConnection,
        target: VotableRef,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM votes WHERE entity_kind = $1 AND entity_id = $2")
            .bind(target.kind.as_str())
            .bind(target.id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
