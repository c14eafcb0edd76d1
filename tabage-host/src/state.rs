//! Application state management
//!
//! The tracker is not started until the extension has sent its first full
//! tab list: reconciling against an empty mirror would wipe every restored
//! record. Tracker events and requests arriving before then are queued and
//! replayed once the runtime is up.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use tabage_core::{
    AgePoller, Clock, Config, HostEvent, MirrorHost, Request, SnapshotStore, Tracker,
    TrackerHandle, TrackerRuntime,
};

use crate::message::{age_frame, error_frame, response_frame, Inbound, InboundEvent};

enum Pending {
    Event(HostEvent),
    Request {
        request_id: Option<Value>,
        request: Request,
    },
}

struct Running {
    handle: TrackerHandle,
    task: JoinHandle<()>,
    /// Holds a handle clone, so it must stop before the runtime can
    poller: JoinHandle<()>,
    pusher: JoinHandle<()>,
}

pub struct AppState {
    mirror: Arc<MirrorHost>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    config: Config,
    out_tx: mpsc::UnboundedSender<Vec<u8>>,
    running: Option<Running>,
    pending: Vec<Pending>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        config: Config,
        out_tx: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Self {
        Self {
            mirror: Arc::new(MirrorHost::new()),
            store,
            clock,
            config,
            out_tx,
            running: None,
            pending: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn dispatch(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Request {
                request_id,
                request,
            } => self.request(request_id, request),
            Inbound::BadRequest { request_id, error } => {
                tracing::debug!(error = %error, "Rejecting request");
                self.send(error_frame(request_id, &error));
            }
            Inbound::Event(event) => self.event(event),
        }
    }

    fn event(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::TabsSnapshot {
                tabs,
                active_tab_id,
            } => {
                tracing::debug!(tab_count = tabs.len(), "Received tab list");
                self.mirror.replace_all(tabs, active_tab_id);
                match &self.running {
                    Some(running) => {
                        if running.handle.reconcile().is_err() {
                            tracing::warn!("Tracker stopped, cannot reconcile");
                        }
                    }
                    None => self.start(),
                }
            }
            InboundEvent::TabCreated { tab } => {
                self.mirror.upsert(tab.clone());
                self.forward(HostEvent::TabCreated { tab });
            }
            InboundEvent::TabUpdated { tab_id, mut tab } => {
                tab.id = tab_id;
                self.mirror.upsert(tab.clone());
                self.forward(HostEvent::TabUpdated { tab_id, tab });
            }
            InboundEvent::TabRemoved { tab_id } => {
                self.mirror.remove(tab_id);
                self.forward(HostEvent::TabRemoved { tab_id });
            }
            InboundEvent::TabActivated { tab_id } => self.mirror.activate(tab_id),
            InboundEvent::WindowFocusChanged { window_id } => {
                self.forward(HostEvent::WindowFocusChanged { window_id });
            }
            InboundEvent::Startup => self.forward(HostEvent::Startup),
            InboundEvent::Installed => self.forward(HostEvent::Installed),
        }
    }

    fn start(&mut self) {
        let tracker = Tracker::new(
            self.mirror.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.config.clone(),
        );
        let (handle, task) = TrackerRuntime::spawn(tracker);
        let (ages, poller) = AgePoller::from_config(handle.clone(), &self.config).spawn();
        let pusher = tokio::spawn(push_ages(ages, self.out_tx.clone()));
        self.running = Some(Running {
            handle,
            task,
            poller,
            pusher,
        });
        tracing::info!(queued = self.pending.len(), "Tracker started");

        for pending in std::mem::take(&mut self.pending) {
            match pending {
                Pending::Event(event) => self.forward(event),
                Pending::Request {
                    request_id,
                    request,
                } => self.request(request_id, request),
            }
        }
    }

    fn forward(&mut self, event: HostEvent) {
        match &self.running {
            Some(running) => {
                if let Err(e) = running.handle.send_event(event) {
                    tracing::warn!(error = %e, "Dropping host event");
                }
            }
            None => self.pending.push(Pending::Event(event)),
        }
    }

    fn request(&mut self, request_id: Option<Value>, request: Request) {
        let Some(running) = &self.running else {
            self.pending.push(Pending::Request {
                request_id,
                request,
            });
            return;
        };

        // Queued here so it stays ordered with the events read after it.
        // Only the answer is awaited off the read loop, so responses may
        // leave out of order.
        let answer = match running.handle.submit(request) {
            Ok(answer) => answer,
            Err(e) => {
                self.send(error_frame(request_id, &e.to_string()));
                return;
            }
        };

        let out_tx = self.out_tx.clone();
        tokio::spawn(async move {
            let frame = match answer.await {
                Ok(response) => match response_frame(request_id.clone(), &response) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, "Cannot encode response");
                        error_frame(request_id, &e.to_string())
                    }
                },
                Err(_) => error_frame(request_id, "Tracker stopped"),
            };
            if out_tx.send(frame).is_err() {
                tracing::warn!("Output closed, dropping response");
            }
        });
    }

    fn send(&self, frame: Vec<u8>) {
        if self.out_tx.send(frame).is_err() {
            tracing::warn!("Output closed, dropping frame");
        }
    }

    /// Stop the tracker and wait for its final snapshot write
    pub async fn shutdown(self) {
        if !self.pending.is_empty() {
            tracing::warn!(
                dropped = self.pending.len(),
                "Shutting down before the tab list arrived"
            );
        }

        if let Some(Running {
            handle,
            task,
            poller,
            pusher,
        }) = self.running
        {
            poller.abort();
            let _ = poller.await;
            drop(handle);
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Tracker runtime failed");
            }
            if let Err(e) = pusher.await {
                tracing::warn!(error = %e, "Age push task failed");
            }
        }
    }
}

/// Forward each polled age of the active tab to the extension
async fn push_ages(
    mut ages: watch::Receiver<Option<u64>>,
    out_tx: mpsc::UnboundedSender<Vec<u8>>,
) {
    while ages.changed().await.is_ok() {
        let Some(age) = *ages.borrow_and_update() else {
            continue;
        };
        if out_tx.send(age_frame(age)).is_err() {
            tracing::debug!("Output closed, stopping age push");
            break;
        }
    }
}
