//! Repository for the `answers` table.

use campusqa_core::content::{AnswerChanges, NewAnswer};
use campusqa_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::answer::AnswerRow;

/// Column list for answers queries.
const COLUMNS: &str = "id, question_id, author_id, body, vote_count, is_accepted, \
    created_at, updated_at";

/// Provides CRUD and acceptance writes for answers.
pub struct AnswerRepo;

impl AnswerRepo {
    /// Insert an answer under an active question.
    ///
    /// Returns `None` when the question is missing or soft-deleted.
    pub async fn create(pool: &PgPool, input: &NewAnswer) -> Result<Option<AnswerRow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO answers (question_id, author_id, body) \
             SELECT id, $2, $3 FROM questions WHERE id = $1 AND is_active \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnswerRow>(&query)
            .bind(input.question_id)
            .bind(input.author_id)
            .bind(&input.body)
            .fetch_optional(pool)
            .await
    }

    /// Find an answer by its ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<AnswerRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM answers WHERE id = $1");
        sqlx::query_as::<_, AnswerRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List answers of a question, oldest first.
    pub async fn list_by_question(
        conn: &mut PgConnection,
        question_id: DbId,
    ) -> Result<Vec<AnswerRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM answers WHERE question_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, AnswerRow>(&query)
            .bind(question_id)
            .fetch_all(conn)
            .await
    }

    /// A user's newest answers, at most `limit`.
    pub async fn list_by_author(
        conn: &mut PgConnection,
        author_id: DbId,
        limit: i64,
    ) -> Result<Vec<AnswerRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM answers WHERE author_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, AnswerRow>(&query)
            .bind(author_id)
            .bind(limit)
            .fetch_all(conn)
            .await
    }

    pub async fn count_by_author(conn: &mut PgConnection, author_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM answers WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(conn)
            .await?;
        Ok(row.0)
    }

    /// Apply content edits to an answer.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &AnswerChanges,
    ) -> Result<Option<AnswerRow>, sqlx::Error> {
        let query = format!(
            "UPDATE answers SET body = COALESCE($2, body), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnswerRow>(&query)
            .bind(id)
            .bind(&changes.body)
            .fetch_optional(pool)
            .await
    }

    /// Mark `answer_id` as the only accepted answer of `question_id`.
    ///
    /// Siblings are cleared first so the partial unique index never sees two
    /// accepted rows. Returns `false` if the answer does not belong to the
    /// question.
    pub async fn accept_only(
        conn: &mut PgConnection,
        question_id: DbId,
        answer_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query(
            "UPDATE answers SET is_accepted = false, updated_at = NOW() \
             WHERE question_id = $1 AND is_accepted AND id <> $2",
        )
        .bind(question_id)
        .bind(answer_id)
        .execute(&mut *conn)
        .await?;

        let result = sqlx::query(
            "UPDATE answers SET is_accepted = true, updated_at = NOW() \
             WHERE id = $2 AND question_id = $1",
        )
        .bind(question_id)
        .bind(answer_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete an answer of `question_id`, returning the removed row.
    pub async fn delete(
        conn: &mut PgConnection,
        id: DbId,
        question_id: DbId,
    ) -> Result<Option<AnswerRow>, sqlx::Error> {
        let query = format!(
            "DELETE FROM answers WHERE id = $1 AND question_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnswerRow>(&query)
            .bind(id)
            .bind(question_id)
            .fetch_optional(conn)
            .await
    }
}
