//! Single-accepted-answer rules.
//!
//! The arbiter decides, from a consistent snapshot of the question and the
//! candidate answer, whether an accept request is rejected, a no-op, or a
//! swap that needs committing together with the author's credit.

use serde::Serialize;

use crate::error::{ensure_author, CoreError};
use crate::reputation::{ReputationCredit, ReputationPolicy};
use crate::types::DbId;

/// What the arbiter needs to know about a question and one of its answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceSnapshot {
    pub question_id: DbId,
    pub question_author_id: DbId,
    pub accepted_answer_id: Option<DbId>,
    /// Optimistic concurrency token of the question row.
    pub question_version: i64,
    pub answer_id: DbId,
    /// The question the answer actually belongs to.
    pub answer_question_id: DbId,
    pub answer_author_id: DbId,
}

/// Outcome of an accept request that passed all checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcceptanceDecision {
    /// The answer is already the accepted one; nothing is written.
    AlreadyAccepted,
    /// Accept the answer, un-accepting `previous` if set.
    Accept {
        previous: Option<DbId>,
        credit: ReputationCredit,
    },
}

/// Decide how to handle `requester_id` accepting the snapshot's answer.
///
/// Fails with [`CoreError::Validation`] when the answer belongs to another
/// question and with [`CoreError::Forbidden`] when the requester does not
/// own the question.
pub fn decide_acceptance(
    snapshot: &AcceptanceSnapshot,
    requester_id: DbId,
    policy: &ReputationPolicy,
) -> Result<AcceptanceDecision, CoreError> {
    if snapshot.answer_question_id != snapshot.question_id {
        return Err(CoreError::Validation(format!(
            "Answer {} does not belong to question {}",
            snapshot.answer_id, snapshot.question_id
        )));
    }

    ensure_author("Question", snapshot.question_author_id, requester_id).map_err(|_| {
        CoreError::Forbidden("Only the question author can accept answers".into())
    })?;

    if snapshot.accepted_answer_id == Some(snapshot.answer_id) {
        return Ok(AcceptanceDecision::AlreadyAccepted);
    }

    Ok(AcceptanceDecision::Accept {
        previous: snapshot.accepted_answer_id,
        credit: ReputationCredit {
            user_id: snapshot.answer_author_id,
            delta: policy.accept_award,
        },
    })
}
