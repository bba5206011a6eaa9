//! The two kinds of content that carry votes and comments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Known votable entity kinds, as stored in the `entity_kind` columns.
pub mod entity_kinds {
    pub const QUESTION: &str = "question";
    pub const ANSWER: &str = "answer";
}

/// A question or an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Question,
    Answer,
}

impl EntityKind {
    /// The lowercase storage identifier (`"question"` / `"answer"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => entity_kinds::QUESTION,
            Self::Answer => entity_kinds::ANSWER,
        }
    }

    /// The capitalised name used in error messages.
    pub fn entity_name(self) -> &'static str {
        match self {
            Self::Question => "Question",
            Self::Answer => "Answer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            entity_kinds::QUESTION => Ok(Self::Question),
            entity_kinds::ANSWER => Ok(Self::Answer),
            other => Err(CoreError::Validation(format!(
                "Invalid entity kind '{other}'. Must be one of: question, answer"
            ))),
        }
    }
}

/// A reference to one votable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VotableRef {
    pub kind: EntityKind,
    pub id: DbId,
}

impl VotableRef {
    pub fn question(id: DbId) -> Self {
        Self {
            kind: EntityKind::Question,
            id,
        }
    }

    pub fn answer(id: DbId) -> Self {
        Self {
            kind: EntityKind::Answer,
            id,
        }
    }

    /// The error to return when this reference does not resolve.
    pub fn not_found(self) -> CoreError {
        CoreError::NotFound {
            entity: self.kind.entity_name(),
            id: self.id,
        }
    }
}
