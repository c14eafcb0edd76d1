//! Tab Registry
//!
//! In-memory map of tab id to [`TabRecord`]. The registry never touches
//! storage itself; callers take a [`RegistrySnapshot`] after each mutation.

use std::collections::{HashMap, HashSet};

use crate::record::TabRecord;
use crate::snapshot::RegistrySnapshot;
use crate::tab::{OpenTab, TabId};

#[derive(Debug, Default, Clone)]
pub struct TabRegistry {
    records: HashMap<TabId, TabRecord>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TabId) -> Option<&TabRecord> {
        self.records.get(&id)
    }

    /// Insert or fully replace the record for `id`
    pub fn put(&mut self, id: TabId, record: TabRecord) -> Option<TabRecord> {
        self.records.insert(id, record)
    }

    pub fn remove(&mut self, id: TabId) -> Option<TabRecord> {
        self.records.remove(&id)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TabId> + '_ {
        self.records.keys().copied()
    }

    /// Update title/url of an existing record. Returns false (and does
    /// nothing) when the tab is unknown.
    pub fn update_metadata(&mut self, id: TabId, title: Option<&str>, url: Option<&str>) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.set_metadata(title, url);
                true
            }
            None => false,
        }
    }

    /// Drop every record whose id is not in `live`. Returns the dropped ids.
    pub fn retain_live(&mut self, live: &HashSet<TabId>) -> Vec<TabId> {
        let mut stale: Vec<TabId> = self
            .records
            .keys()
            .filter(|id| !live.contains(id))
            .copied()
            .collect();
        stale.sort();

        for id in &stale {
            self.records.remove(id);
        }

        stale
    }

    /// Insert a record stamped `now` for every open tab without one.
    /// Returns the ids that were added.
    pub fn adopt_missing<'a, I>(&mut self, tabs: I, now: i64) -> Vec<TabId>
    where
        I: IntoIterator<Item = &'a OpenTab>,
    {
        let mut added = Vec::new();
        for tab in tabs {
            if !self.records.contains_key(&tab.id) {
                self.records.insert(tab.id, TabRecord::observed(tab, now));
                added.push(tab.id);
            }
        }
        added
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.records
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect()
    }

    /// Replace the whole registry with a previously persisted snapshot
    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        self.records = snapshot.into_iter().collect();
    }
}
