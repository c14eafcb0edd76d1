//! Tab age record

use serde::{Deserialize, Serialize};

use crate::tab::OpenTab;

/// Title stored when the host reports none (or an empty one)
pub const DEFAULT_TITLE: &str = "New Tab";

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// What the registry remembers about one tab.
///
/// Serialized field names match the persisted snapshot format:
/// `{"created": <ms>, "title": "...", "url": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRecord {
    /// First observation time, milliseconds since the Unix epoch. Never
    /// changes once the record exists.
    pub created: i64,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl TabRecord {
    pub fn new(created: i64, title: Option<&str>, url: Option<&str>) -> Self {
        Self {
            created,
            title: normalize_title(title),
            url: url.unwrap_or_default().to_string(),
        }
    }

    /// Record for a tab first seen at `created`
    pub fn observed(tab: &OpenTab, created: i64) -> Self {
        Self::new(created, tab.title.as_deref(), tab.url.as_deref())
    }

    /// Replace title and url, leaving `created` untouched
    pub fn set_metadata(&mut self, title: Option<&str>, url: Option<&str>) {
        self.title = normalize_title(title);
        self.url = url.unwrap_or_default().to_string();
    }

    /// Milliseconds elapsed between creation and `now`, never negative
    pub fn age_at(&self, now: i64) -> u64 {
        now.saturating_sub(self.created).max(0) as u64
    }
}

fn normalize_title(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => default_title(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let record = TabRecord::new(10, None, None);
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.url, "");

        let record = TabRecord::new(10, Some(""), Some("https://example.com"));
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.url, "https://example.com");
    }

    #[test]
    fn test_age_is_clamped() {
        let record = TabRecord::new(1_000, Some("t"), None);
        assert_eq!(record.age_at(66_000), 65_000);
        assert_eq!(record.age_at(1_000), 0);
        // Clock stepped backwards
        assert_eq!(record.age_at(500), 0);
    }

    #[test]
    fn test_age_is_monotonic() {
        let record = TabRecord::new(0, None, None);
        let mut last = 0;
        for now in [0, 1, 999, 65_000, 3_600_000] {
            let age = record.age_at(now);
            assert!(age >= last);
            last = age;
        }
    }

    #[test]
    fn test_set_metadata_keeps_created() {
        let mut record = TabRecord::new(42, Some("Old"), Some("https://old"));
        record.set_metadata(Some("New"), None);
        assert_eq!(record.created, 42);
        assert_eq!(record.title, "New");
        assert_eq!(record.url, "");
    }

    #[test]
    fn test_deserialize_partial_record() {
        let record: TabRecord = serde_json::from_str(r#"{"created": 5}"#).unwrap();
        assert_eq!(record, TabRecord::new(5, None, None));
    }
}
