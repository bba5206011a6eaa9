//! Reputation award constants, policy, and the per-user account.
//!
//! Accounts are never written directly by request handlers. They only move
//! through [`ReputationCredit`]s issued by the vote ledger and the
//! acceptance arbiter, and every adapter applies a credit as an atomic
//! increment.

use serde::{Deserialize, Serialize};

use crate::types::DbId;
use crate::voting::VoteState;

/// Score of an account that has never been credited.
pub const DEFAULT_REPUTATION: i64 = 1;

/// Credited to the author when their content receives an upvote.
pub const UPVOTE_AWARD: i64 = 10;

/// Credited (negative) to the author when their content receives a downvote.
pub const DOWNVOTE_PENALTY: i64 = -2;

/// Credited to the author of an answer when it becomes the accepted answer.
pub const ACCEPT_AWARD: i64 = 15;

/// Award amounts plus the withdrawal rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationPolicy {
    pub upvote_award: i64,
    pub downvote_penalty: i64,
    pub accept_award: i64,
    /// When `false`, withdrawing or switching a vote never takes back what
    /// the earlier vote granted.
    pub reverse_on_withdraw: bool,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            upvote_award: UPVOTE_AWARD,
            downvote_penalty: DOWNVOTE_PENALTY,
            accept_award: ACCEPT_AWARD,
            reverse_on_withdraw: false,
        }
    }
}

impl ReputationPolicy {
    /// The amount the author receives while a voter sits in `state`.
    pub fn grant_for(&self, state: VoteState) -> i64 {
        match state {
            VoteState::None => 0,
            VoteState::Upvoted => self.upvote_award,
            VoteState::Downvoted => self.downvote_penalty,
        }
    }
}

/// A single signed adjustment to one user's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReputationCredit {
    pub user_id: DbId,
    pub delta: i64,
}

/// A user's cumulative score. No floor is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReputationAccount {
    pub user_id: DbId,
    pub score: i64,
}

impl ReputationAccount {
    /// A lazily created account at [`DEFAULT_REPUTATION`].
    pub fn new(user_id: DbId) -> Self {
        Self {
            user_id,
            score: DEFAULT_REPUTATION,
        }
    }

    /// Apply a signed delta and return the new score.
    pub fn apply(&mut self, delta: i64) -> i64 {
        self.score = self.score.saturating_add(delta);
        self.score
    }
}
