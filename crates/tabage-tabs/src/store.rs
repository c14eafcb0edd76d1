//! Snapshot persistence
//!
//! A store holds exactly one registry snapshot. Writers replace it wholesale.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use tabage_storage::Database;

use crate::error::TabError;
use crate::snapshot::RegistrySnapshot;
use crate::Result;

/// Storage key the snapshot is written under by default
pub const DEFAULT_STORAGE_KEY: &str = "tabAges";

pub trait SnapshotStore: Send + Sync {
    /// Last persisted snapshot, `None` if nothing was ever written
    fn load(&self) -> Result<Option<RegistrySnapshot>>;

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self) -> Result<Option<RegistrySnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}

/// Snapshot kept as JSON under one key of the SQLite key-value table
#[derive(Clone)]
pub struct DatabaseStore {
    db: Database,
    key: String,
}

impl DatabaseStore {
    pub fn new(db: Database) -> Self {
        Self::with_key(db, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(db: Database, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl SnapshotStore for DatabaseStore {
    fn load(&self) -> Result<Option<RegistrySnapshot>> {
        let Some(value) = self.db.get_json::<serde_json::Value>(&self.key)? else {
            return Ok(None);
        };

        match RegistrySnapshot::from_json_lenient(value) {
            Some(snapshot) => Ok(Some(snapshot)),
            None => {
                tracing::warn!(key = %self.key, "Stored snapshot is not an object, ignoring");
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        self.db.set_json(&self.key, snapshot)?;
        Ok(())
    }
}

/// In-process store. Failures can be injected to exercise the
/// best-effort paths.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<RegistrySnapshot>>,
    failing_reads: AtomicU32,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        let store = Self::default();
        *store.snapshot.lock() = Some(snapshot);
        store
    }

    /// Fail the next `count` loads
    pub fn fail_next_reads(&self, count: u32) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Currently stored snapshot
    pub fn current(&self) -> Option<RegistrySnapshot> {
        self.snapshot.lock().clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<RegistrySnapshot>> {
        let pending = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Err(TabError::StoreUnavailable("injected read failure".to_string()));
        }

        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TabError::StoreUnavailable("injected write failure".to_string()));
        }

        *self.snapshot.lock() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TabRecord;
    use crate::tab::TabId;

    fn sample() -> RegistrySnapshot {
        [(TabId(3), TabRecord::new(30, Some("Three"), None))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_database_store() {
        let db = Database::open_in_memory().unwrap();
        let store = DatabaseStore::new(db.clone());

        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));

        // Raw value uses string keys
        let raw = db.get_value(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert!(raw.contains(r#""3":"#));
    }

    #[test]
    fn test_database_store_ignores_non_object() {
        let db = Database::open_in_memory().unwrap();
        db.set_value("custom", "[1,2,3]").unwrap();

        let store = DatabaseStore::with_key(db, "custom");
        assert_eq!(store.key(), "custom");
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_injected_failures() {
        let store = MemoryStore::with_snapshot(sample());

        store.fail_next_reads(2);
        assert!(store.load().is_err());
        assert!(store.load().is_err());
        assert_eq!(store.load().unwrap(), Some(sample()));

        store.set_fail_writes(true);
        assert!(store.save(&RegistrySnapshot::new()).is_err());
        assert_eq!(store.save_count(), 0);

        store.set_fail_writes(false);
        store.save(&RegistrySnapshot::new()).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.current(), Some(RegistrySnapshot::new()));
    }
}
