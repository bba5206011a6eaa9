//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the user id carried by a validated Bearer token.

pub mod auth;
