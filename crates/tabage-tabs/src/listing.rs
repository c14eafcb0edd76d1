//! Tab listing for the popup
//!
//! Joins the host's open tabs with the registry and orders them by age.
//! Open tabs without a record are left out.

use serde::{Deserialize, Serialize};

use crate::format;
use crate::record::DEFAULT_TITLE;
use crate::snapshot::RegistrySnapshot;
use crate::tab::{OpenTab, TabId};

/// Tabs older than this are flagged as old by default (one hour)
pub const DEFAULT_OLD_TAB_THRESHOLD_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Youngest tab first
    #[default]
    #[serde(rename = "asc")]
    NewestFirst,
    /// Oldest tab first
    #[serde(rename = "desc")]
    OldestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabAgeEntry {
    pub id: TabId,
    pub title: String,
    pub url: String,
    pub age_ms: u64,
    pub label: String,
    pub is_active: bool,
    pub is_old: bool,
}

pub fn build(
    open_tabs: &[OpenTab],
    snapshot: &RegistrySnapshot,
    now: i64,
    order: SortOrder,
    old_threshold_ms: u64,
) -> Vec<TabAgeEntry> {
    let mut entries: Vec<TabAgeEntry> = open_tabs
        .iter()
        .filter_map(|tab| {
            let record = snapshot.get(tab.id)?;
            let age_ms = record.age_at(now);
            let title = match tab.title.as_deref() {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => DEFAULT_TITLE.to_string(),
            };

            Some(TabAgeEntry {
                id: tab.id,
                title,
                url: tab.url.clone().unwrap_or_default(),
                age_ms,
                label: format::verbose(age_ms),
                is_active: tab.active,
                is_old: age_ms > old_threshold_ms,
            })
        })
        .collect();

    match order {
        SortOrder::NewestFirst => entries.sort_by_key(|e| e.age_ms),
        SortOrder::OldestFirst => entries.sort_by(|a, b| b.age_ms.cmp(&a.age_ms)),
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TabRecord;

    fn snapshot() -> RegistrySnapshot {
        [
            (TabId(1), TabRecord::new(0, Some("stored"), None)),
            (TabId(2), TabRecord::new(3_000_000, None, None)),
            (TabId(3), TabRecord::new(3_500_000, None, None)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_listing_order_and_flags() {
        let open = vec![
            OpenTab::new(1).with_title("Live title").with_url("https://a"),
            OpenTab::new(2).activated(),
            OpenTab::new(3).with_title(""),
            // No record: omitted
            OpenTab::new(4),
        ];
        let now = 3_600_001;

        let newest = build(
            &open,
            &snapshot(),
            now,
            SortOrder::NewestFirst,
            DEFAULT_OLD_TAB_THRESHOLD_MS,
        );
        let ids: Vec<i64> = newest.iter().map(|e| e.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let oldest = build(
            &open,
            &snapshot(),
            now,
            SortOrder::OldestFirst,
            DEFAULT_OLD_TAB_THRESHOLD_MS,
        );
        let first = &oldest[0];
        assert_eq!(first.id, TabId(1));
        assert_eq!(first.title, "Live title");
        assert_eq!(first.url, "https://a");
        assert!(first.is_old);
        assert_eq!(first.label, "1 hour ago");

        let tab2 = oldest.iter().find(|e| e.id == TabId(2)).unwrap();
        assert!(tab2.is_active);
        assert!(!tab2.is_old);

        let tab3 = oldest.iter().find(|e| e.id == TabId(3)).unwrap();
        assert_eq!(tab3.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_sort_order_wire_names() {
        assert_eq!(serde_json::to_string(&SortOrder::OldestFirst).unwrap(), r#""desc""#);
        let order: SortOrder = serde_json::from_str(r#""asc""#).unwrap();
        assert_eq!(order, SortOrder::NewestFirst);
    }
}
