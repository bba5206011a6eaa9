//! Vote toggle state machine and the per-entity vote ledger.
//!
//! Each `(entity, user)` pair is in exactly one [`VoteState`]. Casting a
//! vote in the direction the user already holds withdraws it; casting the
//! opposite direction switches it. The tally is always the signed
//! difference of the two membership sets.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::reputation::ReputationPolicy;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Direction and state
// ---------------------------------------------------------------------------

/// The direction carried by a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// The `SMALLINT` stored in the `votes.direction` column.
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Up),
            -1 => Some(Self::Down),
            _ => None,
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(CoreError::Validation(format!(
                "Invalid vote '{other}'. Must be one of: up, down"
            ))),
        }
    }
}

/// Where one user currently stands on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    None,
    Upvoted,
    Downvoted,
}

impl VoteState {
    /// The state reached by voting `direction` from nowhere.
    pub fn held(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => Self::Upvoted,
            VoteDirection::Down => Self::Downvoted,
        }
    }

    pub fn direction(self) -> Option<VoteDirection> {
        match self {
            Self::None => None,
            Self::Upvoted => Some(VoteDirection::Up),
            Self::Downvoted => Some(VoteDirection::Down),
        }
    }

    /// Contribution of this state to the entity's tally.
    pub fn weight(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Upvoted => 1,
            Self::Downvoted => -1,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// The effect of casting one vote from a known state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteTransition {
    pub from: VoteState,
    pub to: VoteState,
    /// Change applied to the entity's `vote_count`.
    pub tally_delta: i64,
    /// Change applied to the author's reputation, or `None` when the
    /// transition issues no credit at all.
    pub reputation_delta: Option<i64>,
}

/// Compute the transition for casting `direction` while in `current`.
///
/// | from      | dir  | to        | tally | credit            |
/// |-----------|------|-----------|-------|-------------------|
/// | none      | up   | upvoted   | +1    | upvote award      |
/// | none      | down | downvoted | -1    | downvote penalty  |
/// | upvoted   | up   | none      | -1    | none              |
/// | downvoted | down | none      | +1    | none              |
/// | upvoted   | down | downvoted | -2    | downvote penalty  |
/// | downvoted | up   | upvoted   | +2    | upvote award      |
///
/// With [`ReputationPolicy::reverse_on_withdraw`] set, leaving a state also
/// takes back that state's grant, folded into the same single credit.
pub fn transition(
    current: VoteState,
    direction: VoteDirection,
    policy: &ReputationPolicy,
) -> VoteTransition {
    let requested = VoteState::held(direction);
    let next = if current == requested {
        VoteState::None
    } else {
        requested
    };

    let reversal = if policy.reverse_on_withdraw {
        -policy.grant_for(current)
    } else {
        0
    };

    let reputation_delta = match next {
        VoteState::None if policy.reverse_on_withdraw => Some(reversal),
        VoteState::None => None,
        held => Some(policy.grant_for(held) + reversal),
    };

    VoteTransition {
        from: current,
        to: next,
        tally_delta: next.weight() - current.weight(),
        reputation_delta,
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Upvoter and downvoter sets for one entity.
///
/// A user id is in at most one set; [`VoteLedger::set_state`] is the only
/// way to change membership and always removes before inserting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    upvoters: HashSet<DbId>,
    downvoters: HashSet<DbId>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_of(&self, user_id: DbId) -> VoteState {
        if self.upvoters.contains(&user_id) {
            VoteState::Upvoted
        } else if self.downvoters.contains(&user_id) {
            VoteState::Downvoted
        } else {
            VoteState::None
        }
    }

    /// `|upvoters| - |downvoters|`.
    pub fn vote_count(&self) -> i64 {
        self.upvoters.len() as i64 - self.downvoters.len() as i64
    }

    /// Put `user_id` into the set matching `state`, removing it elsewhere.
    pub fn set_state(&mut self, user_id: DbId, state: VoteState) {
        self.upvoters.remove(&user_id);
        self.downvoters.remove(&user_id);
        match state {
            VoteState::Upvoted => {
                self.upvoters.insert(user_id);
            }
            VoteState::Downvoted => {
                self.downvoters.insert(user_id);
            }
            VoteState::None => {}
        }
    }

    /// Upvoter ids in ascending order.
    pub fn upvoters(&self) -> Vec<DbId> {
        sorted(&self.upvoters)
    }

    /// Downvoter ids in ascending order.
    pub fn downvoters(&self) -> Vec<DbId> {
        sorted(&self.downvoters)
    }
}

fn sorted(set: &HashSet<DbId>) -> Vec<DbId> {
    let mut ids: Vec<DbId> = set.iter().copied().collect();
    ids.sort_unstable();
    ids
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
