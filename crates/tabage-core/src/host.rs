//! Host browser seam
//!
//! The tracker asks the host two questions: which tabs are open, and which
//! tab is active in the focused window. [`MirrorHost`] answers them from a
//! locally maintained copy of the host's tab list, fed by host events.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use tabage_tabs::{OpenTab, TabId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Extension context invalidated")]
    ContextInvalidated,

    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Every tab currently open, across all windows
    async fn open_tabs(&self) -> Result<Vec<OpenTab>, HostError>;

    /// Active tab of the focused window, if any
    async fn active_tab(&self) -> Result<Option<OpenTab>, HostError>;
}

#[derive(Debug, Default)]
struct MirrorState {
    tabs: Vec<OpenTab>,
    active: Option<TabId>,
}

/// In-memory view of the host's tabs
#[derive(Debug)]
pub struct MirrorHost {
    state: RwLock<MirrorState>,
    available: AtomicBool,
}

impl Default for MirrorHost {
    fn default() -> Self {
        Self {
            state: RwLock::new(MirrorState::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl MirrorHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tabs(tabs: Vec<OpenTab>) -> Self {
        let host = Self::default();
        host.replace_all(tabs, None);
        host
    }

    /// Replace the whole tab list. `active` wins over any `active` flags in
    /// `tabs`; without it the first flagged tab is taken.
    pub fn replace_all(&self, tabs: Vec<OpenTab>, active: Option<TabId>) {
        let mut state = self.state.write();
        state.active = active.or_else(|| tabs.iter().find(|t| t.active).map(|t| t.id));
        state.tabs = tabs;
        let active = state.active;
        for tab in &mut state.tabs {
            tab.active = Some(tab.id) == active;
        }
    }

    /// Insert a tab, or replace the one with the same id
    pub fn upsert(&self, mut tab: OpenTab) {
        let mut state = self.state.write();
        if tab.active {
            state.active = Some(tab.id);
            for other in &mut state.tabs {
                other.active = false;
            }
        } else {
            tab.active = state.active == Some(tab.id);
        }

        match state.tabs.iter().position(|t| t.id == tab.id) {
            Some(index) => state.tabs[index] = tab,
            None => state.tabs.push(tab),
        }
    }

    pub fn remove(&self, id: TabId) -> bool {
        let mut state = self.state.write();
        let before = state.tabs.len();
        state.tabs.retain(|t| t.id != id);
        if state.active == Some(id) {
            state.active = None;
        }
        state.tabs.len() != before
    }

    /// Make `id` the active tab. Unknown ids clear the active tab.
    pub fn activate(&self, id: TabId) {
        let mut state = self.state.write();
        let known = state.tabs.iter().any(|t| t.id == id);
        state.active = known.then_some(id);
        for tab in &mut state.tabs {
            tab.active = known && tab.id == id;
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().tabs.is_empty()
    }

    /// Simulate the extension context going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), HostError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(HostError::ContextInvalidated)
        }
    }
}

#[async_trait]
impl Host for MirrorHost {
    async fn open_tabs(&self) -> Result<Vec<OpenTab>, HostError> {
        self.check_available()?;
        Ok(self.state.read().tabs.clone())
    }

    async fn active_tab(&self) -> Result<Option<OpenTab>, HostError> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state
            .active
            .and_then(|id| state.tabs.iter().find(|t| t.id == id).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mirror_tracks_active_tab() {
        let host = MirrorHost::with_tabs(vec![OpenTab::new(1), OpenTab::new(2).activated()]);
        assert_eq!(host.active_tab().await.unwrap().unwrap().id, TabId(2));

        host.activate(TabId(1));
        let tabs = host.open_tabs().await.unwrap();
        assert!(tabs.iter().find(|t| t.id == TabId(1)).unwrap().active);
        assert!(!tabs.iter().find(|t| t.id == TabId(2)).unwrap().active);

        host.remove(TabId(1));
        assert!(host.active_tab().await.unwrap().is_none());
        assert_eq!(host.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_keeps_active() {
        let host = MirrorHost::new();
        host.upsert(OpenTab::new(3).with_title("Loading").activated());
        host.upsert(OpenTab::new(3).with_title("Loaded"));

        let active = host.active_tab().await.unwrap().unwrap();
        assert_eq!(active.title.as_deref(), Some("Loaded"));
        assert!(active.active);
        assert_eq!(host.len(), 1);
    }

    #[tokio::test]
    async fn test_activate_unknown_clears() {
        let host = MirrorHost::with_tabs(vec![OpenTab::new(1).activated()]);
        host.activate(TabId(9));
        assert!(host.active_tab().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_host() {
        let host = MirrorHost::with_tabs(vec![OpenTab::new(1)]);
        host.set_available(false);
        assert_eq!(host.open_tabs().await, Err(HostError::ContextInvalidated));
        assert_eq!(host.active_tab().await, Err(HostError::ContextInvalidated));
    }
}
