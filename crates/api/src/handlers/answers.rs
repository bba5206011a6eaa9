//! Handlers for answers: content, votes, acceptance, and comments.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use campusqa_core::content::AnswerChanges;
use campusqa_core::types::DbId;
use campusqa_core::votable::EntityKind;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::{CommentRequest, VoteRequest};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /answers`.
#[derive(Debug, Deserialize)]
pub struct CreateAnswerRequest {
    pub question_id: DbId,
    pub body: String,
}

/// POST /answers
pub async fn create_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateAnswerRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let answer = state
        .engine
        .create_answer(input.question_id, auth.user_id, &input.body)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: answer })))
}

/// GET /answers/{id}
pub async fn get_answer(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let answer = state.engine.get_answer(id).await?;
    Ok(Json(DataResponse { data: answer }))
}

/// PUT /answers/{id}
pub async fn update_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: Result<Json<AnswerChanges>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(changes) = payload?;
    let answer = state.engine.update_answer(id, auth.user_id, changes).await?;

    tracing::info!(user_id = auth.user_id, answer_id = id, "Answer updated");

    Ok(Json(DataResponse { data: answer }))
}

/// DELETE /answers/{id}
///
/// Hard delete. Clears the question's acceptance if this answer held it.
pub async fn delete_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.engine.delete_answer(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /answers/{id}/vote
pub async fn vote_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let outcome = state
        .engine
        .cast_vote(EntityKind::Answer, id, auth.user_id, input.vote)
        .await?;

    Ok(Json(DataResponse { data: outcome }))
}

/// POST /answers/{id}/accept
///
/// Only the author of the owning question may accept. Returns the question.
pub async fn accept_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let answer = state.engine.get_answer(id).await?;
    let question = state
        .engine
        .accept_answer(answer.question_id, id, auth.user_id)
        .await?;

    Ok(Json(DataResponse { data: question }))
}

/// POST /answers/{id}/comments
pub async fn comment_on_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let comment = state
        .engine
        .add_comment(EntityKind::Answer, id, auth.user_id, &input.text)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}
