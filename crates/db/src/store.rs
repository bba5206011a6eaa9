//! PostgreSQL adapter for the engine's storage port.
//!
//! Every commit is a single transaction. A vote locks the entity row and
//! checks the voter's own row against the snapshot; an acceptance swap checks
//! the question's `version`. A failed check, a serialization failure, or a
//! lost race on a unique index all surface as
//! [`StoreError::VersionConflict`] so the coordinator can re-read and retry.
//!
//! Views are read inside one `REPEATABLE READ` transaction, so a row's
//! `vote_count` always agrees with the voters and comments shown beside it.

use std::collections::HashMap;

use campusqa_core::acceptance::AcceptanceSnapshot;
use campusqa_core::comments::Comment;
use campusqa_core::content::{
    AnswerChanges, AnswerView, NewAnswer, NewQuestion, QuestionChanges, QuestionFilter,
    QuestionView, UserActivity,
};
use campusqa_core::store::{
    AcceptanceCommit, ConsistencyStore, StoreError, VoteCommit, VoteSnapshot,
};
use campusqa_core::types::DbId;
use campusqa_core::votable::{EntityKind, VotableRef};
use campusqa_core::voting::{VoteLedger, VoteState};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::models::answer::AnswerRow;
use crate::models::question::QuestionRow;
use crate::repositories::{
    lock_votable, AnswerRepo, CommentRepo, QuestionRepo, ReputationRepo, VoteRepo,
};

/// SQLSTATE codes that mean "another writer got there first".
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

// ---------------------------------------------------------------------------
// Error plumbing
// ---------------------------------------------------------------------------

/// Internal failure of one store call, before classification.
#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Failure {
    /// Classify into the port's taxonomy. Races on `target` become
    /// retryable conflicts; anything else from the database is unavailable.
    fn settle(self, target: Option<VotableRef>) -> StoreError {
        let err = match self {
            Failure::Store(err) => return err,
            Failure::Database(err) => err,
        };
        let raced = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| {
                matches!(
                    code.as_ref(),
                    SERIALIZATION_FAILURE | DEADLOCK_DETECTED | UNIQUE_VIOLATION
                )
            });
        match target {
            Some(target) if raced => {
                tracing::debug!(
                    entity = target.kind.entity_name(),
                    id = target.id,
                    error = %err,
                    "Database race reported as version conflict"
                );
                conflict(target)
            }
            _ => {
                tracing::error!(error = %err, "Database error");
                StoreError::Unavailable(err.to_string())
            }
        }
    }
}

fn conflict(target: VotableRef) -> StoreError {
    StoreError::VersionConflict {
        entity: target.kind.entity_name(),
        id: target.id,
    }
}

fn not_found(target: VotableRef) -> StoreError {
    StoreError::NotFound {
        entity: target.kind.entity_name(),
        id: target.id,
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

fn question_view(row: QuestionRow, ledger: &VoteLedger, comments: Vec<Comment>) -> QuestionView {
    QuestionView {
        id: row.id,
        author_id: row.author_id,
        title: row.title,
        body: row.body,
        tags: row.tags,
        vote_count: row.vote_count,
        upvoters: ledger.upvoters(),
        downvoters: ledger.downvoters(),
        accepted_answer_id: row.accepted_answer_id,
        views: row.views,
        is_active: row.is_active,
        comments,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn answer_view(row: AnswerRow, ledger: &VoteLedger, comments: Vec<Comment>) -> AnswerView {
    AnswerView {
        id: row.id,
        question_id: row.question_id,
        author_id: row.author_id,
        body: row.body,
        vote_count: row.vote_count,
        upvoters: ledger.upvoters(),
        downvoters: ledger.downvoters(),
        is_accepted: row.is_accepted,
        comments,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Vote ledgers and comment logs for a batch of entities.
async fn extras(
    conn: &mut PgConnection,
    kind: EntityKind,
    ids: &[DbId],
) -> Result<HashMap<DbId, (VoteLedger, Vec<Comment>)>, Failure> {
    let mut extras: HashMap<DbId, (VoteLedger, Vec<Comment>)> = HashMap::new();
    if ids.is_empty() {
        return Ok(extras);
    }

    for vote in VoteRepo::list_for(&mut *conn, kind, ids).await? {
        let (ledger, _) = extras.entry(vote.entity_id).or_default();
        ledger.set_state(vote.user_id, vote.state());
    }
    for comment in CommentRepo::list_for(&mut *conn, kind, ids).await? {
        let (_, log) = extras.entry(comment.entity_id).or_default();
        log.push(comment.into());
    }
    Ok(extras)
}

/// Attach voters and comments to question rows.
async fn question_views(
    conn: &mut PgConnection,
    rows: Vec<QuestionRow>,
) -> Result<Vec<QuestionView>, Failure> {
    let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
    let mut extras = extras(conn, EntityKind::Question, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let (ledger, comments) = extras.remove(&row.id).unwrap_or_default();
            question_view(row, &ledger, comments)
        })
        .collect())
}

/// Attach voters and comments to answer rows.
async fn answer_views(
    conn: &mut PgConnection,
    rows: Vec<AnswerRow>,
) -> Result<Vec<AnswerView>, Failure> {
    let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
    let mut extras = extras(conn, EntityKind::Answer, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let (ledger, comments) = extras.remove(&row.id).unwrap_or_default();
            answer_view(row, &ledger, comments)
        })
        .collect())
}

async fn load_question(conn: &mut PgConnection, id: DbId) -> Result<Option<QuestionView>, Failure> {
    let Some(row) = QuestionRepo::find_active(&mut *conn, id).await? else {
        return Ok(None);
    };
    Ok(question_views(conn, vec![row]).await?.pop())
}

async fn load_answer(conn: &mut PgConnection, id: DbId) -> Result<Option<AnswerView>, Failure> {
    let Some(row) = AnswerRepo::find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    Ok(answer_views(conn, vec![row]).await?.pop())
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// [`ConsistencyStore`] backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a read-only transaction whose statements share one snapshot.
    async fn snapshot(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    async fn find_question_unit(&self, id: DbId) -> Result<Option<QuestionView>, Failure> {
        let mut tx = self.snapshot().await?;
        let view = load_question(&mut tx, id).await?;
        tx.commit().await?;
        Ok(view)
    }

    async fn find_answer_unit(&self, id: DbId) -> Result<Option<AnswerView>, Failure> {
        let mut tx = self.snapshot().await?;
        let view = load_answer(&mut tx, id).await?;
        tx.commit().await?;
        Ok(view)
    }

    async fn list_questions_unit(&self, filter: &QuestionFilter) -> Result<Vec<QuestionView>, Failure> {
        let mut tx = self.snapshot().await?;
        let rows = QuestionRepo::list_active(&mut tx, filter).await?;
        let views = question_views(&mut tx, rows).await?;
        tx.commit().await?;
        Ok(views)
    }

    async fn list_answers_unit(&self, question_id: DbId) -> Result<Vec<AnswerView>, Failure> {
        let mut tx = self.snapshot().await?;
        let rows = AnswerRepo::list_by_question(&mut tx, question_id).await?;
        let views = answer_views(&mut tx, rows).await?;
        tx.commit().await?;
        Ok(views)
    }

    async fn user_activity_unit(&self, user_id: DbId, limit: usize) -> Result<UserActivity, Failure> {
        let limit = sql_limit(limit);
        let mut tx = self.snapshot().await?;

        let rows = QuestionRepo::list_by_author(&mut tx, user_id, limit).await?;
        let questions = question_views(&mut tx, rows).await?;
        let rows = AnswerRepo::list_by_author(&mut tx, user_id, limit).await?;
        let answers = answer_views(&mut tx, rows).await?;
        let question_count = QuestionRepo::count_active_by_author(&mut tx, user_id).await?;
        let answer_count = AnswerRepo::count_by_author(&mut tx, user_id).await?;
        let reputation = ReputationRepo::score(&mut tx, user_id).await?;

        tx.commit().await?;
        Ok(UserActivity {
            user_id,
            reputation,
            questions,
            answers,
            question_count,
            answer_count,
        })
    }

    // -----------------------------------------------------------------------
    // Units
    // -----------------------------------------------------------------------

    async fn insert_answer_unit(&self, input: &NewAnswer) -> Result<AnswerView, Failure> {
        let row = AnswerRepo::create(&self.pool, input)
            .await?
            .ok_or_else(|| not_found(VotableRef::question(input.question_id)))?;
        Ok(answer_view(row, &VoteLedger::new(), Vec::new()))
    }

    async fn update_question_unit(
        &self,
        id: DbId,
        changes: &QuestionChanges,
    ) -> Result<Option<QuestionView>, Failure> {
        if QuestionRepo::update(&self.pool, id, changes).await?.is_none() {
            return Ok(None);
        }
        self.find_question_unit(id).await
    }

    async fn update_answer_unit(
        &self,
        id: DbId,
        changes: &AnswerChanges,
    ) -> Result<Option<AnswerView>, Failure> {
        if AnswerRepo::update(&self.pool, id, changes).await?.is_none() {
            return Ok(None);
        }
        self.find_answer_unit(id).await
    }

    async fn remove_answer_unit(&self, id: DbId) -> Result<bool, Failure> {
        let target = VotableRef::answer(id);
        let mut tx = self.pool.begin().await?;

        let Some(answer) = AnswerRepo::find_by_id(&mut tx, id).await? else {
            return Ok(false);
        };
        // Question before answer, the order acceptance takes them in.
        QuestionRepo::lock(&mut tx, answer.question_id).await?;
        let Some(removed) = AnswerRepo::delete(&mut tx, id, answer.question_id).await? else {
            return Ok(false);
        };
        QuestionRepo::release_answer(&mut tx, removed.question_id, id).await?;
        VoteRepo::delete_for_entity(&mut tx, target).await?;
        CommentRepo::delete_for_entity(&mut tx, target).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn load_vote_unit(
        &self,
        target: VotableRef,
        user_id: DbId,
    ) -> Result<VoteSnapshot, Failure> {
        let standing = VoteRepo::standing(&self.pool, target, user_id)
            .await?
            .ok_or_else(|| not_found(target))?;
        Ok(VoteSnapshot {
            target,
            author_id: standing.author_id,
            current: standing.state(),
        })
    }

    async fn commit_vote_unit(&self, commit: &VoteCommit) -> Result<i64, Failure> {
        let target = commit.target;
        let mut tx = self.pool.begin().await?;

        if !lock_votable(&mut tx, target).await? {
            return Err(not_found(target).into());
        }
        // A fresh statement after the lock sees every vote committed before it.
        let current = VoteRepo::find(&mut tx, target, commit.user_id)
            .await?
            .map_or(VoteState::None, |vote| vote.state());
        if current != commit.transition.from {
            return Err(conflict(target).into());
        }

        let vote_count = VoteRepo::apply_tally(&mut tx, target, commit.transition.tally_delta).await?;
        match commit.transition.to.direction() {
            Some(direction) => VoteRepo::upsert(&mut tx, target, commit.user_id, direction).await?,
            None => {
                VoteRepo::delete(&mut tx, target, commit.user_id).await?;
            }
        }

        if let Some(credit) = commit.credit {
            ReputationRepo::credit(&mut tx, credit.user_id, credit.delta).await?;
        }

        tx.commit().await?;
        Ok(vote_count)
    }

    async fn load_acceptance_unit(
        &self,
        question_id: DbId,
        answer_id: DbId,
    ) -> Result<AcceptanceSnapshot, Failure> {
        let mut tx = self.snapshot().await?;
        let question = QuestionRepo::find_active(&mut tx, question_id)
            .await?
            .ok_or_else(|| not_found(VotableRef::question(question_id)))?;
        let answer = AnswerRepo::find_by_id(&mut tx, answer_id)
            .await?
            .ok_or_else(|| not_found(VotableRef::answer(answer_id)))?;
        tx.commit().await?;

        Ok(AcceptanceSnapshot {
            question_id,
            question_author_id: question.author_id,
            accepted_answer_id: question.accepted_answer_id,
            question_version: question.version,
            answer_id,
            answer_question_id: answer.question_id,
            answer_author_id: answer.author_id,
        })
    }

    async fn commit_acceptance_unit(&self, commit: &AcceptanceCommit) -> Result<(), Failure> {
        let question = VotableRef::question(commit.question_id);
        let mut tx = self.pool.begin().await?;

        if !QuestionRepo::set_accepted(
            &mut tx,
            commit.question_id,
            commit.expected_version,
            commit.answer_id,
        )
        .await?
        {
            return Err(conflict(question).into());
        }
        if !AnswerRepo::accept_only(&mut tx, commit.question_id, commit.answer_id).await? {
            return Err(not_found(VotableRef::answer(commit.answer_id)).into());
        }
        ReputationRepo::credit(&mut tx, commit.credit.user_id, commit.credit.delta).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn append_comment_unit(
        &self,
        target: VotableRef,
        author_id: DbId,
        text: &str,
    ) -> Result<Comment, Failure> {
        let mut tx = self.pool.begin().await?;

        if !lock_votable(&mut tx, target).await? {
            return Err(not_found(target).into());
        }
        let row = CommentRepo::append(&mut tx, target, author_id, text).await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn reputation_unit(&self, user_id: DbId) -> Result<i64, Failure> {
        let mut conn = self.pool.acquire().await?;
        Ok(ReputationRepo::score(&mut conn, user_id).await?)
    }
}

impl ConsistencyStore for PgStore {
    async fn insert_question(&self, input: &NewQuestion) -> Result<QuestionView, StoreError> {
        QuestionRepo::create(&self.pool, input)
            .await
            .map(|row| question_view(row, &VoteLedger::new(), Vec::new()))
            .map_err(|e| Failure::from(e).settle(None))
    }

    async fn insert_answer(&self, input: &NewAnswer) -> Result<AnswerView, StoreError> {
        self.insert_answer_unit(input)
            .await
            .map_err(|e| e.settle(None))
    }

    async fn find_question(&self, id: DbId) -> Result<Option<QuestionView>, StoreError> {
        self.find_question_unit(id)
            .await
            .map_err(|e| e.settle(None))
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<QuestionView>, StoreError> {
        self.list_questions_unit(filter)
            .await
            .map_err(|e| e.settle(None))
    }

    async fn user_activity(&self, user_id: DbId, limit: usize) -> Result<UserActivity, StoreError> {
        self.user_activity_unit(user_id, limit)
            .await
            .map_err(|e| e.settle(None))
    }

    async fn record_question_view(&self, id: DbId) -> Result<bool, StoreError> {
        QuestionRepo::increment_views(&self.pool, id)
            .await
            .map_err(|e| Failure::from(e).settle(None))
    }

    async fn find_answer(&self, id: DbId) -> Result<Option<AnswerView>, StoreError> {
        self.find_answer_unit(id)
            .await
            .map_err(|e| e.settle(None))
    }

    async fn list_answers(&self, question_id: DbId) -> Result<Vec<AnswerView>, StoreError> {
        self.list_answers_unit(question_id)
            .await
            .map_err(|e| e.settle(None))
    }

    async fn update_question(
        &self,
        id: DbId,
        changes: &QuestionChanges,
    ) -> Result<Option<QuestionView>, StoreError> {
        self.update_question_unit(id, changes)
            .await
            .map_err(|e| e.settle(None))
    }

    async fn update_answer(
        &self,
        id: DbId,
        changes: &AnswerChanges,
    ) -> Result<Option<AnswerView>, StoreError> {
        self.update_answer_unit(id, changes)
            .await
            .map_err(|e| e.settle(None))
    }

    async fn deactivate_question(&self, id: DbId) -> Result<bool, StoreError> {
        QuestionRepo::deactivate(&self.pool, id)
            .await
            .map_err(|e| Failure::from(e).settle(Some(VotableRef::question(id))))
    }

    async fn remove_answer(&self, id: DbId) -> Result<bool, StoreError> {
        self.remove_answer_unit(id)
            .await
            .map_err(|e| e.settle(Some(VotableRef::answer(id))))
    }

    async fn load_vote(
        &self,
        target: VotableRef,
        user_id: DbId,
    ) -> Result<VoteSnapshot, StoreError> {
        self.load_vote_unit(target, user_id)
            .await
            .map_err(|e| e.settle(Some(target)))
    }

    async fn commit_vote(&self, commit: &VoteCommit) -> Result<i64, StoreError> {
        self.commit_vote_unit(commit)
            .await
            .map_err(|e| e.settle(Some(commit.target)))
    }

    async fn load_acceptance(
        &self,
        question_id: DbId,
        answer_id: DbId,
    ) -> Result<AcceptanceSnapshot, StoreError> {
        self.load_acceptance_unit(question_id, answer_id)
            .await
            .map_err(|e| e.settle(Some(VotableRef::question(question_id))))
    }

    async fn commit_acceptance(&self, commit: &AcceptanceCommit) -> Result<(), StoreError> {
        self.commit_acceptance_unit(commit)
            .await
            .map_err(|e| e.settle(Some(VotableRef::question(commit.question_id))))
    }

    async fn append_comment(
        &self,
        target: VotableRef,
        author_id: DbId,
        text: &str,
    ) -> Result<Comment, StoreError> {
        self.append_comment_unit(target, author_id, text)
            .await
            .map_err(|e| e.settle(Some(target)))
    }

    async fn reputation(&self, user_id: DbId) -> Result<i64, StoreError> {
        self.reputation_unit(user_id)
            .await
            .map_err(|e| e.settle(None))
    }
}
