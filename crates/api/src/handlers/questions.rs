//! Handlers for questions and their votes and comments.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use campusqa_core::content::{QuestionChanges, QuestionSort};
use campusqa_core::types::DbId;
use campusqa_core::votable::EntityKind;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::{CommentRequest, VoteRequest};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /questions`.
#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Query string of `GET /questions`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuestionsParams {
    pub tag: Option<String>,
    pub sort: Option<String>,
}

/// GET /questions?tag=&sort=
///
/// Active questions carrying `tag` (any when absent), newest first unless
/// `sort` names another order. Listing does not count as a view.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<ListQuestionsParams>,
) -> AppResult<impl IntoResponse> {
    let sort = params
        .sort
        .as_deref()
        .map(QuestionSort::parse)
        .transpose()?
        .unwrap_or_default();
    let questions = state
        .engine
        .list_questions(params.tag.as_deref(), sort)
        .await?;

    Ok(Json(DataResponse { data: questions }))
}

/// POST /questions
pub async fn create_question(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let question = state
        .engine
        .create_question(auth.user_id, &input.title, &input.body, &input.tags)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: question })))
}

/// GET /questions/{id}
///
/// Returns the question with voters and comments. Counts as a view.
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let question = state.engine.get_question(id).await?;
    Ok(Json(DataResponse { data: question }))
}

/// PUT /questions/{id}
pub async fn update_question(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: Result<Json<QuestionChanges>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(changes) = payload?;
    let question = state
        .engine
        .update_question(id, auth.user_id, changes)
        .await?;

    tracing::info!(user_id = auth.user_id, question_id = id, "Question updated");

    Ok(Json(DataResponse { data: question }))
}

/// DELETE /questions/{id}
///
/// Soft delete; the row is kept but hidden.
pub async fn delete_question(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.engine.delete_question(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /questions/{id}/vote
pub async fn vote_question(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let outcome = state
        .engine
        .cast_vote(EntityKind::Question, id, auth.user_id, input.vote)
        .await?;

    Ok(Json(DataResponse { data: outcome }))
}

/// POST /questions/{id}/comments
pub async fn comment_on_question(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let comment = state
        .engine
        .add_comment(EntityKind::Question, id, auth.user_id, &input.text)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// GET /questions/{id}/answers
///
/// Answers oldest first.
pub async fn list_answers(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let answers = state.engine.list_answers(id).await?;
    Ok(Json(DataResponse { data: answers }))
}
