//! # Ember Store
//!
//! Durable persistence for the emotional state: a singleton SQLite record
//! with crash-safe upserts, an interaction audit log, and the boot-time
//! gateway that applies offline decay catch-up before handing the state to
//! the engine.

mod gateway;
mod sqlite;

pub use gateway::StateGateway;
pub use sqlite::SqliteStore;
