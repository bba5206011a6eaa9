//! HTTP handlers, one module per resource.
//!
//! Request bodies are taken as `Result<Json<T>, JsonRejection>` so malformed
//! payloads come back through [`AppError`](crate::error::AppError) with the
//! standard `{ "error", "code" }` body.

use campusqa_core::voting::VoteDirection;
use serde::Deserialize;

pub mod answers;
pub mod questions;
pub mod users;

/// Body of `POST .../vote`.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// `"up"` or `"down"`.
    pub vote: VoteDirection,
}

/// Body of `POST .../comments`.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}
