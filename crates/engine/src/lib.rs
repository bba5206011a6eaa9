//! Consistency coordinator for votes, acceptance, and comments.
//!
//! [`ConsistencyCoordinator`] is the only entry point request handlers use.
//! It runs every operation as one bounded unit against a
//! [`ConsistencyStore`](campusqa_core::store::ConsistencyStore), retrying
//! optimistic version conflicts. [`MemoryStore`] is an in-process adapter
//! used by tests and local tooling.

pub mod config;
pub mod coordinator;
pub mod memory;

pub use config::EngineConfig;
pub use coordinator::{ConsistencyCoordinator, VoteOutcome};
pub use memory::MemoryStore;
