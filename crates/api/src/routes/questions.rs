//! Route definitions for questions, mounted at `/questions`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::questions;
use crate::state::AppState;

/// ```text
/// GET    /?tag=&sort=       -> list_questions
/// POST   /                  -> create_question
/// GET    /{id}              -> get_question
/// PUT    /{id}              -> update_question
/// DELETE /{id}              -> delete_question
/// POST   /{id}/vote         -> vote_question
/// POST   /{id}/comments     -> comment_on_question
/// GET    /{id}/answers      -> list_answers
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(questions::list_questions).post(questions::create_question),
        )
        .route(
            "/{id}",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        )
        .route("/{id}/vote", post(questions::vote_question))
        .route("/{id}/comments", post(questions::comment_on_question))
        .route("/{id}/answers", get(questions::list_answers))
}
