//! Repository for the `questions` table.

use campusqa_core::content::{NewQuestion, QuestionChanges, QuestionFilter, QuestionSort};
use campusqa_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::question::QuestionRow;

/// Column list for questions queries.
const COLUMNS: &str = "id, author_id, title, body, tags, vote_count, accepted_answer_id, \
    views, is_active, version, created_at, updated_at";

/// `ORDER BY` clause for a listing sort. Ties fall back to newest first.
fn order_by(sort: QuestionSort) -> &'static str {
    match sort {
        QuestionSort::Newest => "created_at DESC, id DESC",
        QuestionSort::Oldest => "created_at ASC, id ASC",
        QuestionSort::Votes => "vote_count DESC, created_at DESC, id DESC",
        QuestionSort::Views => "views DESC, created_at DESC, id DESC",
    }
}

/// Provides CRUD and versioned writes for questions.
pub struct QuestionRepo;

impl QuestionRepo {
    /// Insert a new question, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewQuestion) -> Result<QuestionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO questions (author_id, title, body, tags) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QuestionRow>(&query)
            .bind(input.author_id)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.tags)
            .fetch_one(pool)
            .await
    }

    /// Find an active question by ID.
    pub async fn find_active(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<QuestionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questions WHERE id = $1 AND is_active");
        sqlx::query_as::<_, QuestionRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Lock a question row, active or not, for the rest of the transaction.
    ///
    /// Returns `false` if the row does not exist.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.is_some())
    }

    /// All active questions matching `filter`.
    pub async fn list_active(
        conn: &mut PgConnection,
        filter: &QuestionFilter,
    ) -> Result<Vec<QuestionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questions \
             WHERE is_active AND ($1::TEXT IS NULL OR $1 = ANY(tags)) \
             ORDER BY {}",
            order_by(filter.sort)
        );
        sqlx::query_as::<_, QuestionRow>(&query)
            .bind(filter.tag.as_deref())
            .fetch_all(conn)
            .await
    }

    /// A user's newest active questions, at most `limit`.
    pub async fn list_by_author(
        conn: &mut PgConnection,
        author_id: DbId,
        limit: i64,
    ) -> Result<Vec<QuestionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questions WHERE author_id = $1 AND is_active \
             ORDER BY {} LIMIT $2",
            order_by(QuestionSort::Newest)
        );
        sqlx::query_as::<_, QuestionRow>(&query)
            .bind(author_id)
            .bind(limit)
            .fetch_all(conn)
            .await
    }

    pub async fn count_active_by_author(
        conn: &mut PgConnection,
        author_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM questions WHERE author_id = $1 AND is_active")
                .bind(author_id)
                .fetch_one(conn)
                .await?;
        Ok(row.0)
    }

    /// Bump the view counter. Returns `false` if the question is not active.
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE questions SET views = views + 1 WHERE id = $1 AND is_active")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply content edits to an active question.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &QuestionChanges,
    ) -> Result<Option<QuestionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE questions SET \
                title = COALESCE($2, title), \
                body = COALESCE($3, body), \
                tags = COALESCE($4, tags), \
                updated_at = NOW() \
             WHERE id = $1 AND is_active \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QuestionRow>(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.body)
            .bind(&changes.tags)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a question. Returns `false` if it was already inactive.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE questions SET is_active = false, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Point the question at `answer_id` if it is still at `expected_version`.
    ///
    /// Returns `false` when the version moved or the question went inactive.
    pub async fn set_accepted(
        conn: &mut PgConnection,
        id: DbId,
        expected_version: i64,
        answer_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE questions \
             SET accepted_answer_id = $3, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $2 AND is_active",
        )
        .bind(id)
        .bind(expected_version)
        .bind(answer_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop the acceptance pointer if it names `answer_id` and bump the
    /// version so in-flight acceptance snapshots go stale.
    pub async fn release_answer(
        conn: &mut PgConnection,
        id: DbId,
        answer_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE questions SET \
                accepted_answer_id = NULLIF(accepted_answer_id, $2), \
                version = version + 1, \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(answer_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
