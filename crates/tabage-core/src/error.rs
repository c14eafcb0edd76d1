//! Core error types

use thiserror::Error;

use crate::host::HostError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] tabage_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] tabage_tabs::TabError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Tracker is not running")]
    TrackerStopped,
}
