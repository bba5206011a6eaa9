pub mod answers;
pub mod health;
pub mod questions;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /questions                          list (?tag=&sort=), create (auth)
/// /questions/{id}                     get, update, delete
/// /questions/{id}/vote                vote up/down (auth)
/// /questions/{id}/comments            add comment (auth)
/// /questions/{id}/answers             list answers
///
/// /answers                            create (auth)
/// /answers/{id}                       get, update, delete
/// /answers/{id}/vote                  vote up/down (auth)
/// /answers/{id}/accept                accept (question author)
/// /answers/{id}/comments              add comment (auth)
///
/// /users/{id}/reputation              reputation score
/// /users/{id}/activity                recent questions and answers
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/questions", questions::router())
        .nest("/answers", answers::router())
        .nest("/users", users::router())
}
