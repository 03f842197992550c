//! Repository layer for database operations
//!
//! Free functions over `&mut SqliteConnection` so an entire import can run
//! inside one transaction.

pub mod categories;
pub mod changes;
pub mod phases;
pub mod projects;
pub mod risks;
pub mod users;

/// Whether a natural-key upsert created a new record or touched an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}
