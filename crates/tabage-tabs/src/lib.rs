//! Tab Age Tracker - Tab Registry
//!
//! Tracks when each browser tab was first observed. The registry is a flat
//! map from host-assigned tab id to [`TabRecord`]; it is persisted as one
//! serialized snapshot and restored on the next start.

mod error;
pub mod format;
pub mod listing;
mod record;
mod registry;
mod snapshot;
mod store;
mod tab;

pub use error::TabError;
pub use listing::{SortOrder, TabAgeEntry};
pub use record::{TabRecord, DEFAULT_TITLE};
pub use registry::TabRegistry;
pub use snapshot::RegistrySnapshot;
pub use store::{DatabaseStore, MemoryStore, SnapshotStore, DEFAULT_STORAGE_KEY};
pub use tab::{OpenTab, TabId};

pub type Result<T> = std::result::Result<T, TabError>;
