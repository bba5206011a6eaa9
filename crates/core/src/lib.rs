//! Domain rules for the campus Q&A consistency engine.
//!
//! This crate has no internal dependencies so the engine, the storage
//! adapters, and the HTTP layer all share one definition of the vote state
//! machine, the acceptance rules, the comment log, and the reputation
//! policy.

pub mod acceptance;
pub mod comments;
pub mod content;
pub mod error;
pub mod reputation;
pub mod store;
pub mod types;
pub mod votable;
pub mod voting;
