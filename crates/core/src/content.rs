//! Question and answer content: read views, inputs, and validation.

use serde::{Deserialize, Serialize};

use crate::comments::Comment;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MIN_TITLE_LENGTH: usize = 15;
pub const MAX_TITLE_LENGTH: usize = 150;
pub const MIN_QUESTION_BODY_LENGTH: usize = 30;
pub const MAX_TAGS: usize = 5;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A question with its vote membership and comment log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub vote_count: i64,
    pub upvoters: Vec<DbId>,
    pub downvoters: Vec<DbId>,
    pub accepted_answer_id: Option<DbId>,
    pub views: i64,
    pub is_active: bool,
    pub comments: Vec<Comment>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An answer with its vote membership and comment log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerView {
    pub id: DbId,
    pub question_id: DbId,
    pub author_id: DbId,
    pub body: String,
    pub vote_count: i64,
    pub upvoters: Vec<DbId>,
    pub downvoters: Vec<DbId>,
    pub is_accepted: bool,
    pub comments: Vec<Comment>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A validated question ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub author_id: DbId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// A validated answer ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub question_id: DbId,
    pub author_id: DbId,
    pub body: String,
}

/// Partial question update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuestionChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Partial answer update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnswerChanges {
    pub body: Option<String>,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// Most recent questions and answers shown in a user's activity.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Ordering of a question listing. Ties fall back to newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSort {
    #[default]
    Newest,
    Oldest,
    Votes,
    Views,
}

impl QuestionSort {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_lowercase().as_str() {
            "" | "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "votes" => Ok(Self::Votes),
            "views" => Ok(Self::Views),
            other => Err(CoreError::Validation(format!(
                "Unknown sort '{other}', expected one of newest, oldest, votes, views"
            ))),
        }
    }
}

/// Which active questions to list, and in what order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// Normalized tag the question must carry.
    pub tag: Option<String>,
    pub sort: QuestionSort,
}

impl QuestionFilter {
    /// Normalize a raw tag the same way stored tags are; a blank tag means
    /// no filter.
    pub fn new(tag: Option<&str>, sort: QuestionSort) -> Self {
        let tag = tag
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        Self { tag, sort }
    }
}

/// What one user has written: the most recent active questions and
/// answers, newest first, plus totals over everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub user_id: DbId,
    pub reputation: i64,
    pub questions: Vec<QuestionView>,
    pub answers: Vec<AnswerView>,
    pub question_count: i64,
    pub answer_count: i64,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_title(title: &str) -> Result<String, CoreError> {
    let trimmed = title.trim();
    let len = trimmed.chars().count();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Title must be between {MIN_TITLE_LENGTH} and {MAX_TITLE_LENGTH} characters, got {len}"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_question_body(body: &str) -> Result<String, CoreError> {
    let len = body.trim().chars().count();
    if len < MIN_QUESTION_BODY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Question body must be at least {MIN_QUESTION_BODY_LENGTH} characters, got {len}"
        )));
    }
    Ok(body.to_string())
}

pub fn validate_answer_body(body: &str) -> Result<String, CoreError> {
    if body.trim().is_empty() {
        return Err(CoreError::Validation("Answer body must not be empty".into()));
    }
    Ok(body.to_string())
}

/// Lowercase and trim tags, dropping blanks and duplicates (first wins).
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, CoreError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    if out.len() > MAX_TAGS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_TAGS} tags are allowed, got {}",
            out.len()
        )));
    }
    Ok(out)
}

impl NewQuestion {
    pub fn prepare(
        author_id: DbId,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> Result<Self, CoreError> {
        Ok(Self {
            author_id,
            title: validate_title(title)?,
            body: validate_question_body(body)?,
            tags: normalize_tags(tags)?,
        })
    }
}

impl NewAnswer {
    pub fn prepare(question_id: DbId, author_id: DbId, body: &str) -> Result<Self, CoreError> {
        Ok(Self {
            question_id,
            author_id,
            body: validate_answer_body(body)?,
        })
    }
}

impl QuestionChanges {
    /// Validate every provided field, normalizing title and tags.
    pub fn validated(self) -> Result<Self, CoreError> {
        Ok(Self {
            title: self.title.as_deref().map(validate_title).transpose()?,
            body: self.body.as_deref().map(validate_question_body).transpose()?,
            tags: self.tags.as_deref().map(normalize_tags).transpose()?,
        })
    }
}

impl AnswerChanges {
    pub fn validated(self) -> Result<Self, CoreError> {
        Ok(Self {
            body: self.body.as_deref().map(validate_answer_body).transpose()?,
        })
    }
}
