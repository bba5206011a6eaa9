//! Row types for the Q&A tables.
//!
//! Each row derives `FromRow` for `query_as` and `Serialize` for direct
//! inspection; conversion into the engine's views lives in `crate::store`.

pub mod answer;
pub mod comment;
pub mod question;
pub mod reputation;
pub mod vote;
