//! Authentication primitives.
//!
//! - [`jwt`] -- access-token validation against the identity service's secret.

pub mod jwt;
