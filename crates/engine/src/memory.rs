//! In-process [`ConsistencyStore`] backed by a single async mutex.
//!
//! Snapshots and commits take the lock separately, so concurrent callers
//! really do race between read and write and the commit guards are what
//! keeps them honest. Each commit mutates entity and account under one
//! lock hold, which makes it all-or-nothing.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::Mutex;

use campusqa_core::acceptance::AcceptanceSnapshot;
use campusqa_core::comments::{next_comment_timestamp, Comment};
use campusqa_core::content::{
    AnswerChanges, AnswerView, NewAnswer, NewQuestion, QuestionChanges, QuestionFilter,
    QuestionSort, QuestionView, UserActivity,
};
use campusqa_core::reputation::{ReputationAccount, ReputationCredit, DEFAULT_REPUTATION};
use campusqa_core::store::{
    AcceptanceCommit, ConsistencyStore, StoreError, VoteCommit, VoteSnapshot,
};
use campusqa_core::types::{DbId, Timestamp};
use campusqa_core::votable::{EntityKind, VotableRef};
use campusqa_core::voting::VoteLedger;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct VotableRecord {
    author_id: DbId,
    ledger: VoteLedger,
    comments: Vec<Comment>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl VotableRecord {
    fn new(author_id: DbId) -> Self {
        let now = Utc::now();
        Self {
            author_id,
            ledger: VoteLedger::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug)]
struct QuestionRecord {
    votable: VotableRecord,
    /// Guards acceptance swaps.
    version: i64,
    title: String,
    body: String,
    tags: Vec<String>,
    views: i64,
    is_active: bool,
    accepted_answer_id: Option<DbId>,
}

#[derive(Debug)]
struct AnswerRecord {
    votable: VotableRecord,
    question_id: DbId,
    body: String,
    is_accepted: bool,
}

fn question_view(id: DbId, q: &QuestionRecord) -> QuestionView {
    QuestionView {
        id,
        author_id: q.votable.author_id,
        title: q.title.clone(),
        body: q.body.clone(),
        tags: q.tags.clone(),
        vote_count: q.votable.ledger.vote_count(),
        upvoters: q.votable.ledger.upvoters(),
        downvoters: q.votable.ledger.downvoters(),
        accepted_answer_id: q.accepted_answer_id,
        views: q.views,
        is_active: q.is_active,
        comments: q.votable.comments.clone(),
        created_at: q.votable.created_at,
        updated_at: q.votable.updated_at,
    }
}

fn answer_view(id: DbId, a: &AnswerRecord) -> AnswerView {
    AnswerView {
        id,
        question_id: a.question_id,
        author_id: a.votable.author_id,
        body: a.body.clone(),
        vote_count: a.votable.ledger.vote_count(),
        upvoters: a.votable.ledger.upvoters(),
        downvoters: a.votable.ledger.downvoters(),
        is_accepted: a.is_accepted,
        comments: a.votable.comments.clone(),
        created_at: a.votable.created_at,
        updated_at: a.votable.updated_at,
    }
}

/// Order the way the Postgres listing does: the sort key, then newest first.
fn sort_questions(views: &mut [QuestionView], sort: QuestionSort) {
    views.sort_by(|a, b| {
        let newest = b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id));
        match sort {
            QuestionSort::Newest => newest,
            QuestionSort::Oldest => newest.reverse(),
            QuestionSort::Votes => b.vote_count.cmp(&a.vote_count).then(newest),
            QuestionSort::Views => b.views.cmp(&a.views).then(newest),
        }
    });
}

fn count(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    last_question_id: DbId,
    last_answer_id: DbId,
    questions: HashMap<DbId, QuestionRecord>,
    answers: BTreeMap<DbId, AnswerRecord>,
    accounts: HashMap<DbId, ReputationAccount>,
}

impl MemoryState {
    fn active_question(&self, id: DbId) -> Option<&QuestionRecord> {
        self.questions.get(&id).filter(|q| q.is_active)
    }

    fn active_question_mut(&mut self, id: DbId) -> Option<&mut QuestionRecord> {
        self.questions.get_mut(&id).filter(|q| q.is_active)
    }

    fn votable(&self, target: VotableRef) -> Option<&VotableRecord> {
        match target.kind {
            EntityKind::Question => self.active_question(target.id).map(|q| &q.votable),
            EntityKind::Answer => self.answers.get(&target.id).map(|a| &a.votable),
        }
    }

    fn votable_mut(&mut self, target: VotableRef) -> Option<&mut VotableRecord> {
        match target.kind {
            EntityKind::Question => self.active_question_mut(target.id).map(|q| &mut q.votable),
            EntityKind::Answer => self.answers.get_mut(&target.id).map(|a| &mut a.votable),
        }
    }

    fn credit(&mut self, credit: ReputationCredit) -> i64 {
        self.accounts
            .entry(credit.user_id)
            .or_insert_with(|| ReputationAccount::new(credit.user_id))
            .apply(credit.delta)
    }
}

fn not_found(target: VotableRef) -> StoreError {
    StoreError::NotFound {
        entity: target.kind.entity_name(),
        id: target.id,
    }
}

fn conflict(target: VotableRef) -> StoreError {
    StoreError::VersionConflict {
        entity: target.kind.entity_name(),
        id: target.id,
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of an entity's vote ledger, for inspection.
    pub async fn ledger(&self, target: VotableRef) -> Option<VoteLedger> {
        let state = self.state.lock().await;
        state.votable(target).map(|v| v.ledger.clone())
    }

    /// Ids of every answer of `question_id` currently flagged accepted.
    pub async fn accepted_answers(&self, question_id: DbId) -> Vec<DbId> {
        let state = self.state.lock().await;
        state
            .answers
            .iter()
            .filter(|(_, a)| a.question_id == question_id && a.is_accepted)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl ConsistencyStore for MemoryStore {
    async fn insert_question(&self, input: &NewQuestion) -> Result<QuestionView, StoreError> {
        let mut state = self.state.lock().await;
        state.last_question_id += 1;
        let id = state.last_question_id;
        let record = QuestionRecord {
            votable: VotableRecord::new(input.author_id),
            version: 0,
            title: input.title.clone(),
            body: input.body.clone(),
            tags: input.tags.clone(),
            views: 0,
            is_active: true,
            accepted_answer_id: None,
        };
        let view = question_view(id, &record);
        state.questions.insert(id, record);
        Ok(view)
    }

    async fn insert_answer(&self, input: &NewAnswer) -> Result<AnswerView, StoreError> {
        let mut state = self.state.lock().await;
        if state.active_question(input.question_id).is_none() {
            return Err(not_found(VotableRef::question(input.question_id)));
        }
        state.last_answer_id += 1;
        let id = state.last_answer_id;
        let record = AnswerRecord {
            votable: VotableRecord::new(input.author_id),
            question_id: input.question_id,
            body: input.body.clone(),
            is_accepted: false,
        };
        let view = answer_view(id, &record);
        state.answers.insert(id, record);
        Ok(view)
    }

    async fn find_question(&self, id: DbId) -> Result<Option<QuestionView>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.active_question(id).map(|q| question_view(id, q)))
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<QuestionView>, StoreError> {
        let state = self.state.lock().await;
        let mut views: Vec<QuestionView> = state
            .questions
            .iter()
            .filter(|(_, q)| q.is_active)
            .filter(|(_, q)| filter.tag.as_ref().map_or(true, |tag| q.tags.contains(tag)))
            .map(|(id, q)| question_view(*id, q))
            .collect();
        sort_questions(&mut views, filter.sort);
        Ok(views)
    }

    async fn user_activity(&self, user_id: DbId, limit: usize) -> Result<UserActivity, StoreError> {
        let state = self.state.lock().await;

        let mut questions: Vec<QuestionView> = state
            .questions
            .iter()
            .filter(|(_, q)| q.is_active && q.votable.author_id == user_id)
            .map(|(id, q)| question_view(*id, q))
            .collect();
        sort_questions(&mut questions, QuestionSort::Newest);

        let mut answers: Vec<AnswerView> = state
            .answers
            .iter()
            .filter(|(_, a)| a.votable.author_id == user_id)
            .map(|(id, a)| answer_view(*id, a))
            .collect();
        answers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let question_count = count(questions.len());
        let answer_count = count(answers.len());
        questions.truncate(limit);
        answers.truncate(limit);

        Ok(UserActivity {
            user_id,
            reputation: state
                .accounts
                .get(&user_id)
                .map_or(DEFAULT_REPUTATION, |a| a.score),
            questions,
            answers,
            question_count,
            answer_count,
        })
    }

    async fn record_question_view(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.active_question_mut(id) {
            Some(q) => {
                q.views += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_answer(&self, id: DbId) -> Result<Option<AnswerView>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.answers.get(&id).map(|a| answer_view(id, a)))
    }

    async fn list_answers(&self, question_id: DbId) -> Result<Vec<AnswerView>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .answers
            .iter()
            .filter(|(_, a)| a.question_id == question_id)
            .map(|(id, a)| answer_view(*id, a))
            .collect())
    }

    async fn update_question(
        &self,
        id: DbId,
        changes: &QuestionChanges,
    ) -> Result<Option<QuestionView>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(q) = state.active_question_mut(id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            q.title = title.clone();
        }
        if let Some(body) = &changes.body {
            q.body = body.clone();
        }
        if let Some(tags) = &changes.tags {
            q.tags = tags.clone();
        }
        q.votable.updated_at = Utc::now();
        Ok(Some(question_view(id, q)))
    }

    async fn update_answer(
        &self,
        id: DbId,
        changes: &AnswerChanges,
    ) -> Result<Option<AnswerView>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(a) = state.answers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(body) = &changes.body {
            a.body = body.clone();
        }
        a.votable.updated_at = Utc::now();
        Ok(Some(answer_view(id, a)))
    }

    async fn deactivate_question(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.active_question_mut(id) {
            Some(q) => {
                q.is_active = false;
                q.version += 1;
                q.votable.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_answer(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(answer) = state.answers.remove(&id) else {
            return Ok(false);
        };
        if let Some(q) = state.questions.get_mut(&answer.question_id) {
            if q.accepted_answer_id == Some(id) {
                q.accepted_answer_id = None;
            }
            q.version += 1;
        }
        Ok(true)
    }

    async fn load_vote(
        &self,
        target: VotableRef,
        user_id: DbId,
    ) -> Result<VoteSnapshot, StoreError> {
        let state = self.state.lock().await;
        let record = state.votable(target).ok_or_else(|| not_found(target))?;
        Ok(VoteSnapshot {
            target,
            author_id: record.author_id,
            current: record.ledger.state_of(user_id),
        })
    }

    async fn commit_vote(&self, commit: &VoteCommit) -> Result<i64, StoreError> {
        let mut state = self.state.lock().await;
        let record = state
            .votable_mut(commit.target)
            .ok_or_else(|| not_found(commit.target))?;
        if record.ledger.state_of(commit.user_id) != commit.transition.from {
            return Err(conflict(commit.target));
        }
        record.ledger.set_state(commit.user_id, commit.transition.to);
        let vote_count = record.ledger.vote_count();

        if let Some(credit) = commit.credit {
            state.credit(credit);
        }
        Ok(vote_count)
    }

    async fn load_acceptance(
        &self,
        question_id: DbId,
        answer_id: DbId,
    ) -> Result<AcceptanceSnapshot, StoreError> {
        let state = self.state.lock().await;
        let question = state
            .active_question(question_id)
            .ok_or_else(|| not_found(VotableRef::question(question_id)))?;
        let answer = state
            .answers
            .get(&answer_id)
            .ok_or_else(|| not_found(VotableRef::answer(answer_id)))?;
        Ok(AcceptanceSnapshot {
            question_id,
            question_author_id: question.votable.author_id,
            accepted_answer_id: question.accepted_answer_id,
            question_version: question.version,
            answer_id,
            answer_question_id: answer.question_id,
            answer_author_id: answer.votable.author_id,
        })
    }

    async fn commit_acceptance(&self, commit: &AcceptanceCommit) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let question_ref = VotableRef::question(commit.question_id);
        let version = state
            .active_question(commit.question_id)
            .map(|q| q.version)
            .ok_or_else(|| not_found(question_ref))?;
        if version != commit.expected_version {
            return Err(conflict(question_ref));
        }
        match state.answers.get(&commit.answer_id) {
            Some(a) if a.question_id == commit.question_id => {}
            _ => return Err(not_found(VotableRef::answer(commit.answer_id))),
        }

        for (id, answer) in state.answers.iter_mut() {
            if answer.question_id == commit.question_id {
                answer.is_accepted = *id == commit.answer_id;
            }
        }
        if let Some(q) = state.questions.get_mut(&commit.question_id) {
            q.accepted_answer_id = Some(commit.answer_id);
            q.version += 1;
        }
        state.credit(commit.credit);
        Ok(())
    }

    async fn append_comment(
        &self,
        target: VotableRef,
        author_id: DbId,
        text: &str,
    ) -> Result<Comment, StoreError> {
        let mut state = self.state.lock().await;
        let record = state.votable_mut(target).ok_or_else(|| not_found(target))?;
        let position = i32::try_from(record.comments.len())
            .map_err(|_| StoreError::Unavailable("comment log is full".into()))?;
        let last = record.comments.last().map(|c| c.created_at);
        let comment = Comment {
            position,
            author_id,
            text: text.to_string(),
            created_at: next_comment_timestamp(last, Utc::now()),
        };
        record.comments.push(comment.clone());
        Ok(comment)
    }

    async fn reputation(&self, user_id: DbId) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .get(&user_id)
            .map_or(DEFAULT_REPUTATION, |a| a.score))
    }
}
