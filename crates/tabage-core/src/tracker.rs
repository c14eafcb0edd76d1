//! Tab age tracker
//!
//! Owns the registry and keeps it in step with host tab events. Every
//! mutation is followed by a fire-and-forget snapshot write. Host failures
//! degrade to "no age information" and are never returned to callers.

use std::collections::HashSet;
use std::sync::Arc;

use tabage_tabs::{
    listing, OpenTab, RegistrySnapshot, SnapshotStore, SortOrder, TabAgeEntry, TabId, TabRecord,
    TabRegistry,
};

use crate::clock::Clock;
use crate::config::Config;
use crate::event::HostEvent;
use crate::host::Host;
use crate::protocol::{Request, Response};
use crate::writer::SnapshotWriter;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records dropped because their tab is no longer open
    pub removed: Vec<TabId>,
    /// Open tabs that got a fresh record
    pub added: Vec<TabId>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty() || !self.added.is_empty()
    }
}

pub struct Tracker {
    registry: TabRegistry,
    host: Arc<dyn Host>,
    store: Arc<dyn SnapshotStore>,
    writer: SnapshotWriter,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl Tracker {
    /// Create a tracker with an empty registry. Must be called inside a
    /// tokio runtime; nothing is loaded until [`Tracker::initialize`].
    pub fn new(
        host: Arc<dyn Host>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        let writer = SnapshotWriter::spawn(Arc::clone(&store));
        Self {
            registry: TabRegistry::new(),
            host,
            store,
            writer,
            clock,
            config,
        }
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Restore the last persisted snapshot, then reconcile against the
    /// tabs that are open right now.
    pub async fn initialize(&mut self) -> ReconcileReport {
        self.restore().await;
        let report = self.reconcile().await;

        tracing::info!(
            tab_count = self.registry.len(),
            removed = report.removed.len(),
            added = report.added.len(),
            "Initialized tab registry"
        );

        report
    }

    async fn restore(&mut self) {
        // Queued writes must land first or the read returns a stale snapshot
        self.writer.flush().await;

        let attempts = self.config.storage_read_attempts.max(1);

        for attempt in 1..=attempts {
            let store = Arc::clone(&self.store);
            let result = tokio::task::spawn_blocking(move || store.load()).await;

            match result {
                Ok(Ok(Some(snapshot))) => {
                    tracing::debug!(entries = snapshot.len(), "Restored tab registry");
                    self.registry.restore(snapshot);
                    return;
                }
                Ok(Ok(None)) => {
                    tracing::debug!("No stored tab registry");
                    return;
                }
                Ok(Err(e)) => {
                    tracing::warn!(attempt, attempts, error = %e, "Failed to read tab registry");
                }
                Err(e) => {
                    tracing::warn!(attempt, attempts, error = %e, "Registry read task failed");
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.config.storage_read_retry_delay()).await;
            }
        }

        tracing::warn!(
            attempts,
            in_memory = self.registry.len(),
            "Giving up on stored tab registry, continuing with in-memory records"
        );
    }

    /// Align the registry with the host's open tabs: drop stale records and
    /// stamp unknown open tabs with the current time.
    pub async fn reconcile(&mut self) -> ReconcileReport {
        let open = match self.host.open_tabs().await {
            Ok(open) => open,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot list open tabs, skipping reconcile");
                return ReconcileReport::default();
            }
        };

        let live: HashSet<TabId> = open.iter().map(|t| t.id).collect();
        let removed = self.registry.retain_live(&live);
        let added = self.registry.adopt_missing(&open, self.clock.now_ms());
        let report = ReconcileReport { removed, added };

        if report.changed() {
            tracing::debug!(
                removed = ?report.removed,
                added = ?report.added,
                "Reconciled tab registry"
            );
            self.persist();
        }

        report
    }

    pub fn on_tab_created(&mut self, tab: &OpenTab) {
        let record = TabRecord::observed(tab, self.clock.now_ms());
        self.registry.put(tab.id, record);
        tracing::debug!(tab_id = %tab.id, "Tab created");
        self.persist();
    }

    /// Refresh title/url of a known tab. Unknown tabs are ignored.
    pub fn on_tab_updated(&mut self, tab_id: TabId, tab: &OpenTab) -> bool {
        let updated =
            self.registry
                .update_metadata(tab_id, tab.title.as_deref(), tab.url.as_deref());
        if updated {
            self.persist();
        }
        updated
    }

    pub fn on_tab_removed(&mut self, tab_id: TabId) -> bool {
        if self.registry.remove(tab_id).is_some() {
            tracing::debug!(tab_id = %tab_id, "Tab removed");
            self.persist();
            true
        } else {
            false
        }
    }

    /// Apply a host notification. Startup and install re-run the full
    /// load path.
    pub async fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::TabCreated { tab } => self.on_tab_created(&tab),
            HostEvent::TabUpdated { tab_id, tab } => {
                self.on_tab_updated(tab_id, &tab);
            }
            HostEvent::TabRemoved { tab_id } => {
                self.on_tab_removed(tab_id);
            }
            HostEvent::WindowFocusChanged { window_id } => {
                tracing::trace!(window_id, "Window focus changed");
            }
            HostEvent::Startup | HostEvent::Installed => {
                self.initialize().await;
            }
        }
    }

    pub fn all_ages(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    /// Age of the focused window's active tab.
    ///
    /// A tab without a record gets one on the spot and reports 0. No active
    /// tab (or no host) also reports 0, without touching the registry.
    pub async fn current_tab_age(&mut self) -> u64 {
        let active = match self.host.active_tab().await {
            Ok(Some(tab)) => tab,
            Ok(None) => {
                tracing::debug!("No active tab");
                return 0;
            }
            Err(e) => {
                tracing::info!(error = %e, "Host unavailable, reporting zero age");
                return 0;
            }
        };

        let now = self.clock.now_ms();
        if let Some(record) = self.registry.get(active.id) {
            return record.age_at(now);
        }

        self.registry
            .put(active.id, TabRecord::observed(&active, now));
        tracing::debug!(tab_id = %active.id, "Created record for active tab on query");
        self.persist();
        0
    }

    /// Open tabs with a record, ordered by age
    pub async fn listing(&self, order: SortOrder) -> Vec<TabAgeEntry> {
        let open = match self.host.open_tabs().await {
            Ok(open) => open,
            Err(e) => {
                tracing::info!(error = %e, "Host unavailable, empty listing");
                return Vec::new();
            }
        };

        listing::build(
            &open,
            &self.registry.snapshot(),
            self.clock.now_ms(),
            order,
            self.config.old_tab_threshold_ms,
        )
    }

    pub async fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::GetTabAges => Response::TabAges {
                tab_ages: self.all_ages(),
            },
            Request::GetCurrentTabAge => Response::CurrentTabAge {
                age: self.current_tab_age().await,
            },
            Request::GetTabListing { sort_order } => Response::TabListing {
                tabs: self.listing(sort_order).await,
            },
        }
    }

    /// Stop the writer after flushing queued snapshots
    pub async fn shutdown(self) {
        self.writer.close().await;
    }

    fn persist(&self) {
        self.writer.submit(self.registry.snapshot());
    }
}
