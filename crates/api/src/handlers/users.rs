//! Handlers for per-user reads.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use campusqa_core::types::DbId;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Reputation read model.
#[derive(Debug, Serialize)]
pub struct ReputationResponse {
    pub user_id: DbId,
    pub reputation: i64,
}

/// GET /users/{id}/reputation
///
/// Users never credited report the default score.
pub async fn get_reputation(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let reputation = state.engine.reputation(user_id).await?;
    Ok(Json(DataResponse {
        data: ReputationResponse {
            user_id,
            reputation,
        },
    }))
}

/// GET /users/{id}/activity
///
/// Recent questions and answers plus totals; unknown users get an empty
/// record with the default score.
pub async fn get_activity(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let activity = state.engine.user_activity(user_id).await?;
    Ok(Json(DataResponse { data: activity }))
}
