//! Tab Age Tracker Storage Layer
//!
//! SQLite-backed local key-value storage. The tracker keeps exactly one
//! serialized registry snapshot here; other keys are free for settings.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
