//! Route definitions for users, mounted at `/users`.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// ```text
/// GET    /{id}/reputation   -> get_reputation
/// GET    /{id}/activity     -> get_activity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/reputation", get(users::get_reputation))
        .route("/{id}/activity", get(users::get_activity))
}
