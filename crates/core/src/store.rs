//! Storage port for the consistency engine.
//!
//! Adapters expose read snapshots and commit methods that apply one logical
//! unit (entity write plus reputation credit) atomically. A commit fails with
//! [`StoreError::VersionConflict`] when what it was computed from moved since
//! the snapshot: the voter's own standing for votes, the question's version
//! for acceptance. The coordinator owns the retry loop.

use std::future::Future;

use crate::acceptance::AcceptanceSnapshot;
use crate::comments::Comment;
use crate::content::{
    AnswerChanges, AnswerView, NewAnswer, NewQuestion, QuestionChanges, QuestionFilter,
    QuestionView, UserActivity,
};
use crate::error::CoreError;
use crate::reputation::ReputationCredit;
use crate::types::DbId;
use crate::votable::VotableRef;
use crate::voting::{VoteState, VoteTransition};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another writer committed first; re-read and try again.
    #[error("Concurrent modification of {entity} {id}")]
    VersionConflict { entity: &'static str, id: DbId },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { entity, id } => {
                CoreError::Conflict(format!("{entity} {id} is being modified concurrently"))
            }
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Unavailable(msg) => CoreError::Storage(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots and commits
// ---------------------------------------------------------------------------

/// One user's standing on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteSnapshot {
    pub target: VotableRef,
    pub author_id: DbId,
    pub current: VoteState,
}

/// A vote transition to apply if the voter still stands at
/// `transition.from`.
///
/// Votes by different users commute (the tally moves by a delta), so only
/// the voter's own standing guards the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCommit {
    pub target: VotableRef,
    pub user_id: DbId,
    pub transition: VoteTransition,
    pub credit: Option<ReputationCredit>,
}

/// An acceptance swap to apply if the question is still at
/// `expected_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceCommit {
    pub question_id: DbId,
    pub expected_version: i64,
    pub answer_id: DbId,
    pub previous: Option<DbId>,
    pub credit: ReputationCredit,
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Persistence operations the coordinator sequences.
///
/// Every method is one atomic unit: either everything it describes lands or
/// nothing does.
pub trait ConsistencyStore: Send + Sync {
    fn insert_question(
        &self,
        input: &NewQuestion,
    ) -> impl Future<Output = Result<QuestionView, StoreError>> + Send;

    /// Fails with `NotFound` when the question is missing or inactive.
    fn insert_answer(
        &self,
        input: &NewAnswer,
    ) -> impl Future<Output = Result<AnswerView, StoreError>> + Send;

    /// Active questions only.
    fn find_question(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<QuestionView>, StoreError>> + Send;

    /// Active questions matching `filter`, unpaginated.
    fn list_questions(
        &self,
        filter: &QuestionFilter,
    ) -> impl Future<Output = Result<Vec<QuestionView>, StoreError>> + Send;

    /// Up to `limit` of the user's newest active questions and newest
    /// answers, with totals and reputation read from the same snapshot.
    fn user_activity(
        &self,
        user_id: DbId,
        limit: usize,
    ) -> impl Future<Output = Result<UserActivity, StoreError>> + Send;

    /// Increment the view counter. Returns `false` if the question is gone.
    fn record_question_view(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn find_answer(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<AnswerView>, StoreError>> + Send;

    /// Answers of a question, oldest first.
    fn list_answers(
        &self,
        question_id: DbId,
    ) -> impl Future<Output = Result<Vec<AnswerView>, StoreError>> + Send;

    fn update_question(
        &self,
        id: DbId,
        changes: &QuestionChanges,
    ) -> impl Future<Output = Result<Option<QuestionView>, StoreError>> + Send;

    fn update_answer(
        &self,
        id: DbId,
        changes: &AnswerChanges,
    ) -> impl Future<Output = Result<Option<AnswerView>, StoreError>> + Send;

    /// Soft-delete. Returns `false` if already inactive or missing.
    fn deactivate_question(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Delete an answer with its votes and comments, clearing the owning
    /// question's acceptance if it pointed here.
    fn remove_answer(&self, id: DbId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn load_vote(
        &self,
        target: VotableRef,
        user_id: DbId,
    ) -> impl Future<Output = Result<VoteSnapshot, StoreError>> + Send;

    /// Apply the membership change, tally delta, and optional credit.
    /// Returns the new `vote_count`.
    fn commit_vote(
        &self,
        commit: &VoteCommit,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    fn load_acceptance(
        &self,
        question_id: DbId,
        answer_id: DbId,
    ) -> impl Future<Output = Result<AcceptanceSnapshot, StoreError>> + Send;

    fn commit_acceptance(
        &self,
        commit: &AcceptanceCommit,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomically push a comment, assigning its position and a timestamp no
    /// earlier than the previous comment's.
    fn append_comment(
        &self,
        target: VotableRef,
        author_id: DbId,
        text: &str,
    ) -> impl Future<Output = Result<Comment, StoreError>> + Send;

    /// Current score, or the default for an account never credited.
    fn reputation(&self, user_id: DbId) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn only_version_conflicts_are_retryable() {
        assert!(StoreError::VersionConflict {
            entity: "Question",
            id: 1
        }
        .is_retryable());
        assert!(!StoreError::Unavailable("down".into()).is_retryable());
    }

    #[test]
    fn maps_to_core_taxonomy() {
        assert_matches!(
            CoreError::from(StoreError::NotFound {
                entity: "Answer",
                id: 3
            }),
            CoreError::NotFound { entity: "Answer", id: 3 }
        );
        assert_matches!(
            CoreError::from(StoreError::Unavailable("pool closed".into())),
            CoreError::Storage(_)
        );
    }
}
