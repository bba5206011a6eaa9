//! The façade that sequences vote, acceptance, and comment units.
//!
//! Every public operation runs under [`EngineConfig::operation_timeout`].
//! Read-modify-write units (votes, acceptance) take a versioned snapshot,
//! decide with the pure rules in `campusqa_core`, and commit; a version
//! conflict re-reads and retries up to [`EngineConfig::max_attempts`].

use std::future::Future;

use serde::Serialize;

use campusqa_core::acceptance::{decide_acceptance, AcceptanceDecision};
use campusqa_core::comments::{normalize_comment_text, Comment};
use campusqa_core::content::{
    AnswerChanges, AnswerView, NewAnswer, NewQuestion, QuestionChanges, QuestionFilter,
    QuestionSort, QuestionView, UserActivity, RECENT_ACTIVITY_LIMIT,
};
use campusqa_core::error::{ensure_author, CoreError};
use campusqa_core::reputation::ReputationCredit;
use campusqa_core::store::{AcceptanceCommit, ConsistencyStore, StoreError, VoteCommit};
use campusqa_core::types::DbId;
use campusqa_core::votable::{EntityKind, VotableRef};
use campusqa_core::voting::{transition, VoteDirection, VoteState};

use crate::config::EngineConfig;

/// Result of a cast vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    pub kind: EntityKind,
    pub entity_id: DbId,
    pub vote_count: i64,
    /// The voter's standing after the cast.
    pub state: VoteState,
    /// Credit issued to the author, if any.
    pub reputation_delta: Option<i64>,
}

/// Why one attempt of a retried unit stopped.
enum AttemptError {
    Retry { entity: &'static str, id: DbId },
    Fail(CoreError),
}

impl From<StoreError> for AttemptError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { entity, id } => Self::Retry { entity, id },
            other => Self::Fail(other.into()),
        }
    }
}

impl From<CoreError> for AttemptError {
    fn from(err: CoreError) -> Self {
        Self::Fail(err)
    }
}

/// Runs engine operations against a [`ConsistencyStore`].
pub struct ConsistencyCoordinator<S> {
    store: S,
    config: EngineConfig,
}

impl<S: ConsistencyStore> ConsistencyCoordinator<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Votes
    // -----------------------------------------------------------------------

    /// Toggle `user_id`'s vote on an entity and credit the author.
    pub async fn cast_vote(
        &self,
        kind: EntityKind,
        entity_id: DbId,
        user_id: DbId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, CoreError> {
        let target = VotableRef { kind, id: entity_id };
        let policy = self.config.policy;

        let outcome = self
            .bounded(
                "cast_vote",
                self.with_retry("cast_vote", move || async move {
                    let snapshot = self.store.load_vote(target, user_id).await?;
                    let step = transition(snapshot.current, direction, &policy);
                    let commit = VoteCommit {
                        target,
                        user_id,
                        transition: step,
                        credit: step.reputation_delta.map(|delta| ReputationCredit {
                            user_id: snapshot.author_id,
                            delta,
                        }),
                    };
                    let vote_count = self.store.commit_vote(&commit).await?;
                    Ok::<_, AttemptError>(VoteOutcome {
                        kind,
                        entity_id,
                        vote_count,
                        state: step.to,
                        reputation_delta: step.reputation_delta,
                    })
                }),
            )
            .await?;

        tracing::info!(
            kind = %kind,
            entity_id,
            user_id,
            direction = %direction,
            vote_count = outcome.vote_count,
            state = ?outcome.state,
            reputation_delta = ?outcome.reputation_delta,
            "Vote cast"
        );
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Acceptance
    // -----------------------------------------------------------------------

    /// Make `answer_id` the accepted answer of `question_id`.
    ///
    /// Re-accepting the current answer writes nothing and credits nobody.
    pub async fn accept_answer(
        &self,
        question_id: DbId,
        answer_id: DbId,
        requester_id: DbId,
    ) -> Result<QuestionView, CoreError> {
        let policy = self.config.policy;

        self.bounded("accept_answer", async move {
            let decision = self
                .with_retry("accept_answer", move || async move {
                    let snapshot = self.store.load_acceptance(question_id, answer_id).await?;
                    let decision = decide_acceptance(&snapshot, requester_id, &policy)?;
                    if let AcceptanceDecision::Accept { previous, credit } = decision {
                        self.store
                            .commit_acceptance(&AcceptanceCommit {
                                question_id,
                                expected_version: snapshot.question_version,
                                answer_id,
                                previous,
                                credit,
                            })
                            .await?;
                    }
                    Ok::<_, AttemptError>(decision)
                })
                .await?;

            match decision {
                AcceptanceDecision::AlreadyAccepted => {
                    tracing::debug!(question_id, answer_id, "Answer already accepted");
                }
                AcceptanceDecision::Accept { previous, credit } => {
                    tracing::info!(
                        question_id,
                        answer_id,
                        previous = ?previous,
                        credited_user = credit.user_id,
                        delta = credit.delta,
                        "Answer accepted"
                    );
                }
            }

            self.require_question(question_id).await
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Append a comment to an entity's log.
    pub async fn add_comment(
        &self,
        kind: EntityKind,
        entity_id: DbId,
        author_id: DbId,
        text: &str,
    ) -> Result<Comment, CoreError> {
        let normalized = normalize_comment_text(text)?;
        let target = VotableRef { kind, id: entity_id };
        let text = normalized.as_str();

        let comment = self
            .bounded(
                "add_comment",
                self.with_retry("add_comment", move || async move {
                    Ok::<_, AttemptError>(self.store.append_comment(target, author_id, text).await?)
                }),
            )
            .await?;

        tracing::info!(
            kind = %kind,
            entity_id,
            author_id,
            position = comment.position,
            "Comment added"
        );
        Ok(comment)
    }

    // -----------------------------------------------------------------------
    // Content lifecycle
    // -----------------------------------------------------------------------

    pub async fn create_question(
        &self,
        author_id: DbId,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> Result<QuestionView, CoreError> {
        let input = NewQuestion::prepare(author_id, title, body, tags)?;
        let question = self
            .bounded("create_question", async {
                Ok::<_, CoreError>(self.store.insert_question(&input).await?)
            })
            .await?;
        tracing::info!(question_id = question.id, author_id, "Question created");
        Ok(question)
    }

    pub async fn create_answer(
        &self,
        question_id: DbId,
        author_id: DbId,
        body: &str,
    ) -> Result<AnswerView, CoreError> {
        let input = NewAnswer::prepare(question_id, author_id, body)?;
        let answer = self
            .bounded("create_answer", async {
                Ok::<_, CoreError>(self.store.insert_answer(&input).await?)
            })
            .await?;
        tracing::info!(answer_id = answer.id, question_id, author_id, "Answer created");
        Ok(answer)
    }

    /// Fetch a question and count the view.
    pub async fn get_question(&self, id: DbId) -> Result<QuestionView, CoreError> {
        self.bounded("get_question", async {
            if !self.store.record_question_view(id).await? {
                return Err(VotableRef::question(id).not_found());
            }
            self.require_question(id).await
        })
        .await
    }

    /// Active questions, optionally narrowed to one tag. Views are not
    /// counted.
    pub async fn list_questions(
        &self,
        tag: Option<&str>,
        sort: QuestionSort,
    ) -> Result<Vec<QuestionView>, CoreError> {
        let filter = QuestionFilter::new(tag, sort);
        self.bounded("list_questions", async {
            Ok::<_, CoreError>(self.store.list_questions(&filter).await?)
        })
        .await
    }

    pub async fn get_answer(&self, id: DbId) -> Result<AnswerView, CoreError> {
        self.bounded("get_answer", self.require_answer(id)).await
    }

    pub async fn list_answers(&self, question_id: DbId) -> Result<Vec<AnswerView>, CoreError> {
        self.bounded("list_answers", async {
            self.require_question(question_id).await?;
            Ok::<_, CoreError>(self.store.list_answers(question_id).await?)
        })
        .await
    }

    pub async fn update_question(
        &self,
        id: DbId,
        requester_id: DbId,
        changes: QuestionChanges,
    ) -> Result<QuestionView, CoreError> {
        let changes = changes.validated()?;
        self.bounded("update_question", async {
            let existing = self.require_question(id).await?;
            ensure_author("Question", existing.author_id, requester_id)?;
            self.store
                .update_question(id, &changes)
                .await?
                .ok_or_else(|| VotableRef::question(id).not_found())
        })
        .await
    }

    pub async fn update_answer(
        &self,
        id: DbId,
        requester_id: DbId,
        changes: AnswerChanges,
    ) -> Result<AnswerView, CoreError> {
        let changes = changes.validated()?;
        self.bounded("update_answer", async {
            let existing = self.require_answer(id).await?;
            ensure_author("Answer", existing.author_id, requester_id)?;
            self.store
                .update_answer(id, &changes)
                .await?
                .ok_or_else(|| VotableRef::answer(id).not_found())
        })
        .await
    }

    /// Soft-delete a question. Only its author may do this.
    pub async fn delete_question(&self, id: DbId, requester_id: DbId) -> Result<(), CoreError> {
        self.bounded("delete_question", async {
            let existing = self.require_question(id).await?;
            ensure_author("Question", existing.author_id, requester_id)?;
            if !self.store.deactivate_question(id).await? {
                return Err(VotableRef::question(id).not_found());
            }
            tracing::info!(question_id = id, "Question deactivated");
            Ok(())
        })
        .await
    }

    /// Delete an answer. Only its author may do this.
    pub async fn delete_answer(&self, id: DbId, requester_id: DbId) -> Result<(), CoreError> {
        self.bounded("delete_answer", async {
            let existing = self.require_answer(id).await?;
            ensure_author("Answer", existing.author_id, requester_id)?;
            if !self.store.remove_answer(id).await? {
                return Err(VotableRef::answer(id).not_found());
            }
            tracing::info!(
                answer_id = id,
                question_id = existing.question_id,
                was_accepted = existing.is_accepted,
                "Answer deleted"
            );
            Ok(())
        })
        .await
    }

    pub async fn reputation(&self, user_id: DbId) -> Result<i64, CoreError> {
        self.bounded("reputation", async {
            Ok::<_, CoreError>(self.store.reputation(user_id).await?)
        })
        .await
    }

    /// A user's recent questions and answers with totals. Unknown users get
    /// an empty record at the default reputation.
    pub async fn user_activity(&self, user_id: DbId) -> Result<UserActivity, CoreError> {
        self.bounded("user_activity", async {
            Ok::<_, CoreError>(
                self.store
                    .user_activity(user_id, RECENT_ACTIVITY_LIMIT)
                    .await?,
            )
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn require_question(&self, id: DbId) -> Result<QuestionView, CoreError> {
        self.store
            .find_question(id)
            .await?
            .ok_or_else(|| VotableRef::question(id).not_found())
    }

    async fn require_answer(&self, id: DbId) -> Result<AnswerView, CoreError> {
        self.store
            .find_answer(id)
            .await?
            .ok_or_else(|| VotableRef::answer(id).not_found())
    }

    /// Abandon `fut` if it outlives the operation timeout.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        match tokio::time::timeout(self.config.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let millis = u64::try_from(self.config.operation_timeout.as_millis())
                    .unwrap_or(u64::MAX);
                tracing::warn!(operation, millis, "Operation timed out");
                Err(CoreError::Timeout { millis })
            }
        }
    }

    /// Run `attempt` until it succeeds, fails for good, or the retry budget
    /// is spent.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut tries: u32 = 0;
        loop {
            tries += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fail(err)) => return Err(err),
                Err(AttemptError::Retry { entity, id }) if tries >= max_attempts => {
                    tracing::warn!(operation, entity, id, tries, "Retry budget exhausted");
                    return Err(CoreError::Conflict(format!(
                        "{entity} {id} is being modified concurrently; gave up after {tries} attempts"
                    )));
                }
                Err(AttemptError::Retry { entity, id }) => {
                    tracing::debug!(operation, entity, id, tries, "Version conflict, retrying");
                    tokio::time::sleep(self.config.retry_backoff * tries).await;
                }
            }
        }
    }
}
