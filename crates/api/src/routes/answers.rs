//! Route definitions for answers, mounted at `/answers`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::answers;
use crate::state::AppState;

/// ```text
/// POST   /                  -> create_answer
/// GET    /{id}              -> get_answer
/// PUT    /{id}              -> update_answer
/// DELETE /{id}              -> delete_answer
/// POST   /{id}/vote         -> vote_answer
/// POST   /{id}/accept       -> accept_answer
/// POST   /{id}/comments     -> comment_on_answer
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(answers::create_answer))
        .route(
            "/{id}",
            get(answers::get_answer)
                .put(answers::update_answer)
                .delete(answers::delete_answer),
        )
        .route("/{id}/vote", post(answers::vote_answer))
        .route("/{id}/accept", post(answers::accept_answer))
        .route("/{id}/comments", post(answers::comment_on_answer))
}
