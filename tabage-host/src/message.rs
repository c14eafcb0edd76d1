//! Inbound messages from the extension and outbound response frames
//!
//! A frame carrying `"action"` is a request; one carrying `"event"` is a
//! host notification. Requests may carry a `"requestId"` that is echoed in
//! the response so the extension can match answers to questions.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use tabage_core::{format, OpenTab, Request, Response, TabId};

use crate::native::MAX_MESSAGE_SIZE;

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message has neither an action nor an event")]
    Unrecognized,

    #[error("Response of {0} bytes exceeds the {MAX_MESSAGE_SIZE} byte message limit")]
    TooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Full list of open tabs, sent when the extension connects
    TabsSnapshot {
        tabs: Vec<OpenTab>,
        #[serde(default, rename = "activeTabId")]
        active_tab_id: Option<TabId>,
    },
    TabCreated {
        tab: OpenTab,
    },
    TabUpdated {
        #[serde(rename = "tabId")]
        tab_id: TabId,
        tab: OpenTab,
    },
    TabRemoved {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    TabActivated {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    WindowFocusChanged {
        #[serde(rename = "windowId")]
        window_id: i64,
    },
    Startup,
    Installed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Request {
        request_id: Option<Value>,
        request: Request,
    },
    /// Had an action, but not one we answer
    BadRequest {
        request_id: Option<Value>,
        error: String,
    },
    Event(InboundEvent),
}

impl Inbound {
    pub fn parse(bytes: &[u8]) -> Result<Self, MessageError> {
        let value: Value = serde_json::from_slice(bytes)?;

        if value.get("action").is_some() {
            let request_id = value.get("requestId").cloned();
            return Ok(match serde_json::from_value::<Request>(value) {
                Ok(request) => Inbound::Request {
                    request_id,
                    request,
                },
                Err(e) => Inbound::BadRequest {
                    request_id,
                    error: e.to_string(),
                },
            });
        }

        if value.get("event").is_some() {
            return Ok(Inbound::Event(serde_json::from_value(value)?));
        }

        Err(MessageError::Unrecognized)
    }
}

/// Encode a response. Fails with [`MessageError::TooLarge`] when the
/// result would not fit in one frame.
pub fn response_frame(
    request_id: Option<Value>,
    response: &Response,
) -> Result<Vec<u8>, MessageError> {
    let mut value = serde_json::to_value(response)?;
    if let (Some(id), Value::Object(map)) = (request_id, &mut value) {
        map.insert("requestId".to_string(), id);
    }
    let frame = serde_json::to_vec(&value)?;
    if frame.len() > MAX_MESSAGE_SIZE {
        return Err(MessageError::TooLarge(frame.len()));
    }
    Ok(frame)
}

pub fn error_frame(request_id: Option<Value>, error: &str) -> Vec<u8> {
    let mut value = json!({ "error": error });
    if let (Some(id), Value::Object(map)) = (request_id, &mut value) {
        map.insert("requestId".to_string(), id);
    }
    value.to_string().into_bytes()
}

/// Unsolicited update of the active tab's age for the page indicator
pub fn age_frame(age: u64) -> Vec<u8> {
    json!({
        "event": "tabAge",
        "age": age,
        "label": format::compact(age),
    })
    .to_string()
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_with_id() {
        let inbound = Inbound::parse(br#"{"action":"getCurrentTabAge","requestId":3}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Request {
                request_id: Some(json!(3)),
                request: Request::GetCurrentTabAge,
            }
        );
    }

    #[test]
    fn test_unknown_action_is_bad_request() {
        match Inbound::parse(br#"{"action":"closeAll","requestId":"x"}"#).unwrap() {
            Inbound::BadRequest { request_id, .. } => assert_eq!(request_id, Some(json!("x"))),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_events() {
        let inbound = Inbound::parse(
            br#"{"event":"tabsSnapshot","tabs":[{"id":1},{"id":2,"active":true}],"activeTabId":2}"#,
        )
        .unwrap();
        match inbound {
            Inbound::Event(InboundEvent::TabsSnapshot {
                tabs,
                active_tab_id,
            }) => {
                assert_eq!(tabs.len(), 2);
                assert_eq!(active_tab_id, Some(TabId(2)));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let inbound = Inbound::parse(br#"{"event":"tabActivated","tabId":5}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Event(InboundEvent::TabActivated { tab_id: TabId(5) })
        );
    }

    #[test]
    fn test_unrecognized_and_malformed() {
        assert!(matches!(
            Inbound::parse(br#"{"hello":1}"#),
            Err(MessageError::Unrecognized)
        ));
        assert!(matches!(
            Inbound::parse(b"not json"),
            Err(MessageError::Json(_))
        ));
        assert!(matches!(
            Inbound::parse(br#"{"event":"tabExploded"}"#),
            Err(MessageError::Json(_))
        ));
    }

    #[test]
    fn test_frames_echo_request_id() {
        let frame = response_frame(Some(json!(9)), &Response::CurrentTabAge { age: 0 }).unwrap();
        let value: Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(value, json!({"age": 0, "requestId": 9}));

        let frame = error_frame(None, "tracker not running");
        let value: Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(value, json!({"error": "tracker not running"}));

        let value: Value = serde_json::from_slice(&age_frame(65_000)).unwrap();
        assert_eq!(value, json!({"event": "tabAge", "age": 65_000, "label": "1m"}));
    }

    #[test]
    fn test_oversized_response_rejected() {
        let url = "x".repeat(MAX_MESSAGE_SIZE);
        let tab_ages = [(TabId(1), tabage_core::TabRecord::new(0, None, Some(url.as_str())))]
            .into_iter()
            .collect();

        match response_frame(Some(json!(1)), &Response::TabAges { tab_ages }) {
            Err(MessageError::TooLarge(size)) => assert!(size > MAX_MESSAGE_SIZE),
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }
}
