//! Tab error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Invalid tab id: {0}")]
    InvalidTabId(String),

    #[error("Storage error: {0}")]
    Storage(#[from] tabage_storage::StorageError),

    #[error("Snapshot store unavailable: {0}")]
    StoreUnavailable(String),
}
