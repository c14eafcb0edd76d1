//! Tab identity and the host's live view of a tab

use serde::{Deserialize, Serialize};

use crate::error::TabError;

/// Host-assigned tab identifier.
///
/// Unique among currently open tabs. The host may reuse an id once the tab
/// holding it has closed; nothing here guards against that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl TabId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for TabId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TabId {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| TabError::InvalidTabId(s.to_string()))
    }
}

/// A tab as reported by the host browser right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTab {
    pub id: TabId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Whether this is the active tab of its window
    #[serde(default)]
    pub active: bool,
}

impl OpenTab {
    pub fn new(id: i64) -> Self {
        Self {
            id: TabId(id),
            title: None,
            url: None,
            active: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tab_id() {
        assert_eq!("42".parse::<TabId>().unwrap(), TabId(42));
        assert_eq!(" -3 ".parse::<TabId>().unwrap(), TabId(-3));
        assert!("abc".parse::<TabId>().is_err());
        assert!("".parse::<TabId>().is_err());
    }

    #[test]
    fn test_open_tab_from_host_json() {
        let tab: OpenTab = serde_json::from_str(r#"{"id": 7, "title": "Docs"}"#).unwrap();
        assert_eq!(tab.id, TabId(7));
        assert_eq!(tab.title.as_deref(), Some("Docs"));
        assert_eq!(tab.url, None);
        assert!(!tab.active);
    }
}
