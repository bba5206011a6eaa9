//! Repository for the `reputation_accounts` table.
//!
//! Accounts are created lazily on first credit, starting from
//! [`DEFAULT_REPUTATION`].

use campusqa_core::reputation::DEFAULT_REPUTATION;
use campusqa_core::types::DbId;
use sqlx::PgConnection;

use crate::models::reputation::ReputationAccountRow;

/// Column list for reputation_accounts queries.
const COLUMNS: &str = "user_id, score, created_at, updated_at";

/// Provides reputation reads and credits.
pub struct ReputationRepo;

impl ReputationRepo {
    pub async fn find(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Option<ReputationAccountRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reputation_accounts WHERE user_id = $1");
        sqlx::query_as::<_, ReputationAccountRow>(&query)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// Current score, or the default for a user never credited.
    pub async fn score(conn: &mut PgConnection, user_id: DbId) -> Result<i64, sqlx::Error> {
        Ok(Self::find(conn, user_id)
            .await?
            .map_or(DEFAULT_REPUTATION, |account| account.score))
    }

    /// Add `delta` to a user's score, opening the account if needed.
    ///
    /// Uses `ON CONFLICT (user_id) DO UPDATE` so concurrent credits add up.
    pub async fn credit(
        conn: &mut PgConnection,
        user_id: DbId,
        delta: i64,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO reputation_accounts (user_id, score) \
             VALUES ($1, $2 + $3) \
             ON CONFLICT (user_id) DO UPDATE \
             SET score = reputation_accounts.score + $3, updated_at = NOW() \
             RETURNING score",
        )
        .bind(user_id)
        .bind(DEFAULT_REPUTATION)
        .bind(delta)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }
}
