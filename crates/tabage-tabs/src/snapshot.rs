//! Serialized form of the registry
//!
//! On disk (and on the wire) a snapshot is a JSON object keyed by the
//! string-encoded tab id:
//!
//! ```text
//! {"7": {"created": 1700000000000, "title": "Docs", "url": "https://..."}}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::TabRecord;
use crate::tab::TabId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrySnapshot(BTreeMap<TabId, TabRecord>);

impl RegistrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from arbitrary JSON, skipping entries that do not
    /// look like `"<integer>": {record}`. Returns `None` when the value is
    /// not an object at all.
    pub fn from_json_lenient(value: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(entries) = value else {
            return None;
        };

        let mut records = BTreeMap::new();
        for (key, raw) in entries {
            let id = match key.parse::<TabId>() {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping snapshot entry");
                    continue;
                }
            };

            match serde_json::from_value::<TabRecord>(raw) {
                Ok(record) => {
                    records.insert(id, record);
                }
                Err(e) => {
                    tracing::warn!(tab_id = %id, error = %e, "Skipping malformed tab record");
                }
            }
        }

        Some(Self(records))
    }

    pub fn get(&self, id: TabId) -> Option<&TabRecord> {
        self.0.get(&id)
    }

    pub fn insert(&mut self, id: TabId, record: TabRecord) -> Option<TabRecord> {
        self.0.insert(id, record)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabId, &TabRecord)> {
        self.0.iter().map(|(id, record)| (*id, record))
    }
}

impl FromIterator<(TabId, TabRecord)> for RegistrySnapshot {
    fn from_iter<I: IntoIterator<Item = (TabId, TabRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RegistrySnapshot {
    type Item = (TabId, TabRecord);
    type IntoIter = std::collections::btree_map::IntoIter<TabId, TabRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
