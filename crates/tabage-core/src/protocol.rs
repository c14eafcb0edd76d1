//! Request/response messages exchanged with the popup and page scripts
//!
//! ```text
//! {"action": "getTabAges"}        -> {"tabAges": {"7": {"created": ..., ...}}}
//! {"action": "getCurrentTabAge"}  -> {"age": 65000}
//! {"action": "getTabListing", "sortOrder": "desc"} -> {"tabs": [...]}
//! ```

use serde::{Deserialize, Serialize};

use tabage_tabs::{RegistrySnapshot, SortOrder, TabAgeEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetTabAges,
    GetCurrentTabAge,
    GetTabListing {
        #[serde(default, rename = "sortOrder")]
        sort_order: SortOrder,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    TabAges {
        #[serde(rename = "tabAges")]
        tab_ages: RegistrySnapshot,
    },
    CurrentTabAge {
        age: u64,
    },
    TabListing {
        tabs: Vec<TabAgeEntry>,
    },
}
