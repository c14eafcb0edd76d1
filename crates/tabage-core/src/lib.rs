//! Tab Age Tracker Core
//!
//! Keeps the tab registry in step with the host browser's tab lifecycle and
//! answers age queries from the popup and page scripts. All registry state is
//! owned by one [`Tracker`], driven through a single-consumer
//! [`TrackerRuntime`].

mod clock;
mod config;
mod error;
mod event;
mod host;
pub mod poller;
mod protocol;
mod runtime;
mod tracker;
mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::CoreError;
pub use event::HostEvent;
pub use host::{Host, HostError, MirrorHost};
pub use poller::AgePoller;
pub use protocol::{Request, Response};
pub use runtime::{Command, TrackerHandle, TrackerRuntime};
pub use tracker::{ReconcileReport, Tracker};
pub use writer::SnapshotWriter;

// Re-export registry types
pub use tabage_storage::{Database, StorageError};
pub use tabage_tabs::{
    format, listing, DatabaseStore, MemoryStore, OpenTab, RegistrySnapshot, SnapshotStore,
    SortOrder, TabAgeEntry, TabError, TabId, TabRecord, TabRegistry,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. Output goes to stderr so stdout stays free for
/// protocol traffic.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
