//! Tab lifecycle and process notifications delivered by the host

use serde::{Deserialize, Serialize};

use tabage_tabs::{OpenTab, TabId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    TabCreated {
        tab: OpenTab,
    },
    /// Title or url of an open tab changed
    TabUpdated {
        #[serde(rename = "tabId")]
        tab_id: TabId,
        tab: OpenTab,
    },
    TabRemoved {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    WindowFocusChanged {
        #[serde(rename = "windowId")]
        window_id: i64,
    },
    /// Browser (re)started the background process
    Startup,
    /// Extension installed or updated
    Installed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_events() {
        let event: HostEvent = serde_json::from_value(json!({
            "event": "tabUpdated",
            "tabId": 4,
            "tab": {"id": 4, "title": "Docs", "url": "https://docs.rs"}
        }))
        .unwrap();
        match event {
            HostEvent::TabUpdated { tab_id, tab } => {
                assert_eq!(tab_id, TabId(4));
                assert_eq!(tab.url.as_deref(), Some("https://docs.rs"));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let event: HostEvent = serde_json::from_value(json!({"event": "startup"})).unwrap();
        assert_eq!(event, HostEvent::Startup);

        let event: HostEvent =
            serde_json::from_value(json!({"event": "tabRemoved", "tabId": 9})).unwrap();
        assert_eq!(event, HostEvent::TabRemoved { tab_id: TabId(9) });
    }
}
